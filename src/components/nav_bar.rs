use dioxus::prelude::*;
use crate::components::common::ToastStack;
use crate::Route;

#[component]
pub fn NavComponent() -> Element {
    rsx! {
        div { class: "min-h-screen flex flex-col",
            nav { class: "nav-bar",
                div { class: "page-container",
                    div { class: "nav-logo",
                        i { class: "bi bi-hospital logo-icon" }
                        span { class: "logo-text", "Painel Operacional" }
                    }

                    div { class: "nav-links",
                        Link {
                            to: Route::EmployeeDashboardComponent {},
                            class: "nav-link",
                            active_class: "active",
                            "Minhas Avaliações"
                        }
                        Link {
                            to: Route::SupplierDashboardComponent {},
                            class: "nav-link",
                            active_class: "active",
                            "Ranking"
                        }
                        Link {
                            to: Route::SupplierListComponent {},
                            class: "nav-link",
                            active_class: "active",
                            "Fornecedores"
                        }
                        Link {
                            to: Route::NirBoardComponent {},
                            class: "nav-link",
                            active_class: "active",
                            "NIR"
                        }
                        Link {
                            to: Route::ProcedureFormComponent {},
                            class: "nav-link",
                            active_class: "active",
                            "Procedimentos"
                        }
                    }
                }
            }

            div { class: "fixed-header-spacer" }

            div { class: "flex-1",
                Outlet::<Route> {}
            }

            ToastStack {}
        }
    }
}

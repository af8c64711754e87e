use crate::config::AppConfig;
use crate::types::ExpertiseLevel;
use crate::views::{ChatView, EstimatesView};
use dioxus::prelude::*;

const BUILDWISE_CSS: Asset = asset!("/assets/buildwise.css");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AppTab {
    Chat,
    Estimates,
}

#[component]
pub fn App() -> Element {
    let config = use_hook(AppConfig::from_env);
    let default_level = config.default_level;
    use_context_provider(move || config.build_service());
    let active_tab = use_signal(|| AppTab::Chat);
    let level = use_signal(move || default_level);

    rsx! {
        document::Link { rel: "stylesheet", href: BUILDWISE_CSS }
        AppHeader { active_tab }
        TabPanels { active_tab, level }
    }
}

#[component]
fn AppHeader(active_tab: Signal<AppTab>) -> Element {
    rsx! {
        div { class: "header no-divider",
            div { class: "header-content",
                span { class: "wordmark", "Buildwise" }
                TabNavigation { active_tab }
            }
        }
    }
}

#[component]
fn TabPanels(active_tab: Signal<AppTab>, level: Signal<ExpertiseLevel>) -> Element {
    rsx! {
        div { class: "tab-panels",
            TabPanel {
                active_tab,
                tab: AppTab::Chat,
                children: rsx!( ChatView { level } ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Estimates,
                children: rsx!( EstimatesView {} ),
            }
        }
    }
}

#[component]
fn TabPanel(active_tab: Signal<AppTab>, tab: AppTab, children: Element) -> Element {
    let is_active = active_tab() == tab;
    let class_suffix = if is_active { "active" } else { "" };
    rsx! {
        div {
            class: format_args!("tab-panel {}", class_suffix),
            aria_hidden: (!is_active).to_string(),
            {children}
        }
    }
}

#[component]
fn TabNavigation(active_tab: Signal<AppTab>) -> Element {
    rsx! {
        div { class: "tabs",
            TabButton { active_tab, tab: AppTab::Chat, label: "Chat" }
            TabButton { active_tab, tab: AppTab::Estimates, label: "Estimates" }
        }
    }
}

#[component]
fn TabButton(active_tab: Signal<AppTab>, tab: AppTab, label: &'static str) -> Element {
    let mut active_tab = active_tab;
    let class = if active_tab() == tab {
        "tab active"
    } else {
        "tab"
    };
    rsx! {
        h1 {
            class: class,
            onclick: move |_| active_tab.set(tab),
            "{label}"
        }
    }
}

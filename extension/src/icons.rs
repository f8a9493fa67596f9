// Lucide icons used by the wallet screens, inlined as SVG.

use dioxus::prelude::*;

/// 24x24 stroke-only frame shared by every icon.
fn outline(class: Option<String>, shape: Element) -> Element {
    rsx! {
        svg {
            class: "{class.unwrap_or_default()}",
            xmlns: "http://www.w3.org/2000/svg",
            width: "24",
            height: "24",
            view_box: "0 0 24 24",
            fill: "none",
            stroke: "currentColor",
            stroke_width: "2",
            stroke_linecap: "round",
            stroke_linejoin: "round",
            {shape}
        }
    }
}

#[component]
pub fn CheckCircle(class: Option<String>) -> Element {
    outline(class, rsx! {
        circle { cx: "12", cy: "12", r: "10" }
        path { d: "m9 12 2 2 4-4" }
    })
}

#[component]
pub fn Copy(class: Option<String>) -> Element {
    outline(class, rsx! {
        rect { width: "14", height: "14", x: "8", y: "8", rx: "2", ry: "2" }
        path { d: "M4 16c-1.1 0-2-.9-2-2V4c0-1.1.9-2 2-2h10c1.1 0 2 .9 2 2" }
    })
}

#[component]
pub fn AlertCircle(class: Option<String>) -> Element {
    outline(class, rsx! {
        circle { cx: "12", cy: "12", r: "10" }
        line { x1: "12", x2: "12", y1: "8", y2: "12" }
        line { x1: "12", x2: "12.01", y1: "16", y2: "16" }
    })
}

#[component]
pub fn Lock(class: Option<String>) -> Element {
    outline(class, rsx! {
        rect { width: "18", height: "11", x: "3", y: "11", rx: "2", ry: "2" }
        path { d: "M7 11V7a5 5 0 0 1 10 0v4" }
    })
}

#[component]
pub fn PanelRight(class: Option<String>) -> Element {
    outline(class, rsx! {
        rect { width: "18", height: "18", x: "3", y: "3", rx: "2" }
        path { d: "M15 3v18" }
    })
}

#[component]
pub fn Wallet(class: Option<String>) -> Element {
    outline(class, rsx! {
        path { d: "M19 7V4a1 1 0 0 0-1-1H5a2 2 0 0 0 0 4h15a1 1 0 0 1 1 1v4h-3a2 2 0 0 0 0 4h3a1 1 0 0 0 1-1v-2a1 1 0 0 0-1-1" }
        path { d: "M3 5v14a2 2 0 0 0 2 2h15a1 1 0 0 0 1-1v-4" }
    })
}

#[component]
pub fn X(class: Option<String>) -> Element {
    outline(class, rsx! {
        path { d: "M18 6 6 18" }
        path { d: "m6 6 12 12" }
    })
}

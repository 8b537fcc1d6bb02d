#![forbid(unsafe_code)]

use navkit_core::dom::CLASS_PROGRESS;
use navkit_core::{
    DomMutation, DropdownMarkup, NavError, NavLink, PageHost, PageMarkup, SectionRect, Target,
};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CssStyleDeclaration, Document, Element, HtmlElement, ScrollBehavior, ScrollToOptions, Window,
};

use crate::selectors;

/// One `.dropdown` and its two required children.
pub(crate) struct DropdownElements {
    pub container: Element,
    pub toggle: Element,
    pub menu: Element,
}

/// Collaborator elements captured once at startup.
///
/// Geometry is read live on every [`PageHost`] call; the element lists are
/// never re-queried.
pub(crate) struct DomPage {
    window: Window,
    document: Document,
    root: Element,
    body: Element,
    pub navbar: Element,
    pub hamburger: Element,
    menu: Element,
    pub links: Vec<Element>,
    pub dropdowns: Vec<DropdownElements>,
    progress_bar: Option<Element>,
}

fn dom_error(err: JsValue) -> NavError {
    NavError::Dom(format!("{err:?}"))
}

fn required(document: &Document, selector: &'static str) -> Result<Element, NavError> {
    document
        .query_selector(selector)
        .map_err(dom_error)?
        .ok_or(NavError::MissingElement(selector))
}

fn query_all(scope: &Document, selector: &str) -> Result<Vec<Element>, NavError> {
    let list = scope.query_selector_all(selector).map_err(dom_error)?;
    Ok((0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

fn child(parent: &Element, index: usize, part: &'static str) -> Result<Element, NavError> {
    parent
        .query_selector(part)
        .map_err(dom_error)?
        .ok_or(NavError::MissingDropdownPart { index, part })
}

impl DomPage {
    /// Query every collaborator, failing on the first one that is missing.
    pub fn query(window: Window) -> Result<(Self, PageMarkup), NavError> {
        let document = window
            .document()
            .ok_or_else(|| NavError::Dom("window has no document".into()))?;
        let root = document
            .document_element()
            .ok_or_else(|| NavError::Dom("document has no root element".into()))?;
        let body: Element = document
            .body()
            .ok_or_else(|| NavError::Dom("document has no body".into()))?
            .into();

        let navbar = required(&document, selectors::NAVBAR)?;
        let hamburger = required(&document, selectors::HAMBURGER)?;
        let menu = required(&document, selectors::MENU)?;
        let links = query_all(&document, selectors::LINK)?;

        let mut dropdowns = Vec::new();
        for (index, container) in query_all(&document, selectors::DROPDOWN)?
            .into_iter()
            .enumerate()
        {
            let toggle = child(&container, index, selectors::DROPDOWN_TOGGLE)?;
            let submenu = child(&container, index, selectors::DROPDOWN_MENU)?;
            dropdowns.push(DropdownElements {
                container,
                toggle,
                menu: submenu,
            });
        }

        let markup = PageMarkup {
            has_navbar: true,
            has_hamburger: true,
            has_menu: true,
            links: links
                .iter()
                .map(|link| NavLink {
                    href: link.get_attribute("href"),
                })
                .collect(),
            dropdowns: vec![DropdownMarkup::COMPLETE; dropdowns.len()],
        };

        let page = Self {
            window,
            document,
            root,
            body,
            navbar,
            hamburger,
            menu,
            links,
            dropdowns,
            progress_bar: None,
        };
        Ok((page, markup))
    }

    /// Apply a mutation batch in order.
    pub fn apply(&mut self, mutations: &[DomMutation]) -> Result<(), JsValue> {
        for mutation in mutations {
            self.apply_one(mutation)?;
        }
        Ok(())
    }

    fn apply_one(&mut self, mutation: &DomMutation) -> Result<(), JsValue> {
        match mutation {
            DomMutation::InsertProgressBar => {
                let bar = self.document.create_element("div")?;
                bar.set_class_name(CLASS_PROGRESS);
                self.body.append_child(&bar)?;
                self.progress_bar = Some(bar);
            }
            DomMutation::SetClass {
                target,
                class,
                present,
            } => match self.element(*target) {
                Some(el) => {
                    el.class_list().toggle_with_force(class, *present)?;
                }
                None => debug!(?target, "class target not present"),
            },
            DomMutation::SetStyle {
                target,
                property,
                value,
            }
            | DomMutation::SetCustomProperty {
                target,
                name: property,
                value,
            } => match self.style(*target) {
                Some(style) => style.set_property(property, value)?,
                None => debug!(?target, "style target not present"),
            },
            DomMutation::ScrollTo { top, smooth } => {
                let options = ScrollToOptions::new();
                options.set_top(*top);
                options.set_behavior(if *smooth {
                    ScrollBehavior::Smooth
                } else {
                    ScrollBehavior::Auto
                });
                self.window.scroll_to_with_scroll_to_options(&options);
            }
        }
        Ok(())
    }

    fn element(&self, target: Target) -> Option<&Element> {
        match target {
            Target::Root => Some(&self.root),
            Target::Body => Some(&self.body),
            Target::Navbar => Some(&self.navbar),
            Target::Hamburger => Some(&self.hamburger),
            Target::Menu => Some(&self.menu),
            Target::ProgressBar => self.progress_bar.as_ref(),
            Target::Link(i) => self.links.get(i),
            Target::DropdownMenu(i) => self.dropdowns.get(i).map(|d| &d.menu),
        }
    }

    fn style(&self, target: Target) -> Option<CssStyleDeclaration> {
        self.element(target)
            .and_then(|el| el.dyn_ref::<HtmlElement>())
            .map(HtmlElement::style)
    }

    fn root_scroll_height(&self) -> f64 {
        f64::from(self.root.scroll_height())
    }
}

fn js_number(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

impl PageHost for DomPage {
    fn scroll_y(&self) -> f64 {
        self.window.page_y_offset().unwrap_or(0.0)
    }

    fn viewport_width(&self) -> f64 {
        js_number(self.window.inner_width())
    }

    fn viewport_height(&self) -> f64 {
        js_number(self.window.inner_height())
    }

    fn document_height(&self) -> f64 {
        self.root_scroll_height()
    }

    fn sections(&self) -> Vec<SectionRect> {
        let Ok(sections) = query_all(&self.document, selectors::SECTION) else {
            return Vec::new();
        };
        sections
            .iter()
            .filter_map(|el| el.dyn_ref::<HtmlElement>())
            .map(|el| {
                SectionRect::new(
                    el.id(),
                    f64::from(el.offset_top()),
                    f64::from(el.client_height()),
                )
            })
            .collect()
    }

    fn anchor_top(&self, selector: &str) -> Option<f64> {
        // Malformed selectors throw in the browser; treat them as absent.
        self.document
            .query_selector(selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .map(|el| f64::from(el.offset_top()))
    }
}

//! In-browser classification of a product card's calls to action.
//!
//! Scripts running in the page only measure; every decision is made by the
//! pure functions in [`cta`] and [`compare`] so it can be tested without a
//! browser.

pub mod compare;
pub mod cta;

use crate::results::{CtaClassification, ObservedCta};
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, Locator};

/// Where locators are evaluated
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    Page(&'a Client),
    Card(&'a Element),
}

impl Scope<'_> {
    pub async fn find_all(&self, locator: Locator<'_>) -> Result<Vec<Element>, CmdError> {
        match self {
            Scope::Page(client) => client.find_all(locator).await,
            Scope::Card(card) => card.find_all(locator).await,
        }
    }

    /// First element matched by `locator`, if any
    pub async fn first(&self, locator: Locator<'_>) -> Result<Option<Element>, CmdError> {
        Ok(self.find_all(locator).await?.into_iter().next())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Scope::Page(_) => "page",
            Scope::Card(_) => "card",
        }
    }
}

/// Runs every classifier against one scope
pub async fn observe(client: &Client, scope: Scope<'_>) -> ObservedCta {
    let mut observed = ObservedCta::default();

    if let Some(element) = cta::find_learn_more(scope).await {
        let (kind, shape) = cta::classify_cta(client, &element).await;
        observed.learn_more_type = Some(kind);
        observed.learn_more_shape = Some(shape);
    }
    if let Some(element) = cta::find_buy_now(scope).await {
        let (_, shape) = cta::classify_cta(client, &element).await;
        observed.buy_now_shape = Some(shape);
    }

    let card = match scope {
        Scope::Card(card) => Some(card),
        Scope::Page(_) => None,
    };
    if let Some(target) = compare::locate_compare(scope).await {
        observed.compare_position = Some(compare::compare_position(client, &target, card).await);
    }

    ::log::debug!("Observed on {} scope: {:?}", scope.label(), observed);
    observed
}

/// Classifies the sample card, falling back to the whole page for gaps
pub async fn classify_sample(client: &Client, card: Option<&Element>) -> CtaClassification {
    let mut observed = match card {
        Some(card) => observe(client, Scope::Card(card)).await,
        None => ObservedCta::default(),
    };

    if card.is_none() || observed.needs_page_pass() {
        ::log::debug!("Running page-wide classification pass");
        let page = observe(client, Scope::Page(client)).await;
        observed.fill_from(page);
    }

    let classification = CtaClassification::resolve(observed);
    ::log::info!(
        "Classified CTAs: learn more {}, buy now {}, compare {}",
        classification.learn_more(),
        classification.buy_now_shape,
        classification.compare_position
    );
    classification
}

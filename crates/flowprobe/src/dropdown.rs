//! Option selection for native and custom dropdowns.
//!
//! Some forms render a real `<select>`, others a scripted combobox whose
//! options only exist after the trigger is clicked. [`Session::select_option`]
//! tries [`DropdownStrategy::NativeLabel`] first and falls back to
//! [`DropdownStrategy::CustomOption`]; both are attempted before the call
//! fails with [`FlowError::OptionNotFound`].

use crate::locator::{FieldRef, Strategy};
use crate::resolver::Requirement;
use crate::result::{FlowError, FlowResult};
use crate::session::Session;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// One way of picking an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropdownStrategy {
    /// Choose the `<option>` whose label matches
    NativeLabel,
    /// Click the trigger, then click `[role=option]` with the label's text
    CustomOption,
}

impl DropdownStrategy {
    /// Strategies in the order they are attempted
    pub const SEQUENCE: [Self; 2] = [Self::NativeLabel, Self::CustomOption];
}

impl fmt::Display for DropdownStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NativeLabel => write!(f, "native-label"),
            Self::CustomOption => write!(f, "custom-option"),
        }
    }
}

/// Successful selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOutcome {
    /// Strategy that picked the option
    pub strategy: DropdownStrategy,
    /// Label that was requested
    pub label: String,
    /// Why earlier strategies were passed over
    pub fallbacks: Vec<String>,
}

impl SelectOutcome {
    /// Whether the first strategy was not enough
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        !self.fallbacks.is_empty()
    }
}

/// Field for the visible option carrying `label` in a custom listbox
#[must_use]
pub fn custom_option(label: &str) -> FieldRef {
    FieldRef::new(format!("option '{label}'")).or(Strategy::role("option").and(Strategy::any_text(label)))
}

impl Session {
    /// Pick `label` in the dropdown `field`
    pub async fn select_option(&self, field: &FieldRef, label: &str) -> FlowResult<SelectOutcome> {
        let mut fallbacks = Vec::new();
        for strategy in DropdownStrategy::SEQUENCE {
            match self.try_dropdown(strategy, field, label).await {
                Ok(()) => {
                    info!(field = field.intent(), label, %strategy, "selected option");
                    return Ok(SelectOutcome {
                        strategy,
                        label: label.to_string(),
                        fallbacks,
                    });
                }
                Err(e) => {
                    warn!(field = field.intent(), label, %strategy, error = %e, "dropdown strategy failed");
                    fallbacks.push(format!("{strategy}: {e}"));
                }
            }
        }
        Err(FlowError::OptionNotFound {
            intent: field.intent().to_string(),
            label: label.to_string(),
            attempts: fallbacks.join("; "),
        })
    }

    async fn try_dropdown(&self, strategy: DropdownStrategy, field: &FieldRef, label: &str) -> FlowResult<()> {
        match strategy {
            DropdownStrategy::NativeLabel => {
                let resolution = self
                    .resolve(field, Requirement::Visible, self.timeouts().action())
                    .await?;
                let dom = self.snapshot().await?;
                let tag = dom.get(resolution.node).map_or("", |el| el.tag.as_str());
                if tag != "select" {
                    return Err(FlowError::driver(format!("{} is a <{tag}>", resolution.node)));
                }
                if self.driver().select_by_label(resolution.node, label).await? {
                    Ok(())
                } else {
                    Err(FlowError::driver(format!("no <option> labelled '{label}'")))
                }
            }
            DropdownStrategy::CustomOption => {
                self.click(field).await?;
                self.click(&custom_option(label)).await
            }
        }
    }
}

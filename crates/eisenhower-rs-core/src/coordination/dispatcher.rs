//! The background context: turns user intents into requests and answers
//! read requests straight from the store.

use super::transport::Transport;
use crate::classifier::Matrix;
use crate::error::EisenhowerError;
use crate::resolver::SubjectCleaner;
use eisenhower_rs_config::{EisenhowerConfig, HostAllowList};
use eisenhower_rs_protocol::{ItemKind, Notice, Preset, Request, Response};
use eisenhower_rs_store::PriorityStore;
use log::{debug, info, warn};
use std::sync::Arc;
use url::Url;

const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=4;

/// Entries of the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Preset(Preset),
    OpenMatrix,
}

impl MenuItem {
    pub const ALL: [MenuItem; 5] = [
        MenuItem::Preset(Preset::DoFirst),
        MenuItem::Preset(Preset::Schedule),
        MenuItem::Preset(Preset::Delegate),
        MenuItem::Preset(Preset::Eliminate),
        MenuItem::OpenMatrix,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MenuItem::Preset(preset) => preset.menu_id(),
            MenuItem::OpenMatrix => "open-popup",
        }
    }

    pub fn title(self) -> String {
        match self {
            MenuItem::Preset(preset) => {
                let category = preset.category();
                format!("{} ({})", category.label(), category.description())
            }
            MenuItem::OpenMatrix => "⚙️ Open matrix".to_string(),
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.id() == id)
    }
}

/// What a menu click led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    /// Reply of the page the request went to.
    Reply(Response),
    OpenMatrix(Matrix),
}

/// Background dispatcher in front of one page transport.
pub struct Dispatcher {
    store: Arc<dyn PriorityStore>,
    transport: Arc<dyn Transport>,
    builtin_hosts: Vec<String>,
    cleaner: SubjectCleaner,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("builtin_hosts", &self.builtin_hosts)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        config: &EisenhowerConfig,
        store: Arc<dyn PriorityStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, EisenhowerError> {
        Ok(Self {
            store,
            transport,
            builtin_hosts: config.hosts.builtin.clone(),
            cleaner: SubjectCleaner::new(&config.locale)?,
        })
    }

    /// Handle a context menu click on the tab showing `tab_url`.
    ///
    /// Mail hosts get the item categorized, every other page is tagged as a
    /// web page.
    pub async fn on_menu_click(&self, item: MenuItem, tab_url: &str) -> MenuOutcome {
        info!("menu clicked (item={}, url={tab_url})", item.id());
        let preset = match item {
            MenuItem::OpenMatrix => {
                return match self.matrix().await {
                    Ok(matrix) => MenuOutcome::OpenMatrix(matrix),
                    Err(err) => {
                        warn!("matrix unavailable (error={err})");
                        MenuOutcome::Reply(Response::failed(err.to_string()))
                    }
                };
            }
            MenuItem::Preset(preset) => preset,
        };
        let (importance, urgency) = preset.levels();
        let request = if self.is_mail_host(tab_url).await {
            Request::CategorizeFromContextMenu {
                importance,
                urgency,
            }
        } else {
            Request::CategorizeWebPage {
                importance,
                urgency,
            }
        };
        MenuOutcome::Reply(self.forward(request).await)
    }

    /// Categorize the selected item with ratings chosen in the picker.
    pub async fn save_from_picker(&self, importance: Option<i32>, urgency: Option<i32>) -> Response {
        match validate_ratings(importance, urgency) {
            Ok((importance, urgency)) => {
                self.forward(Request::SavePriority {
                    importance,
                    urgency,
                })
                .await
            }
            Err(err) => {
                debug!("picker input rejected (error={err})");
                Response::Failed {
                    error: err.to_string(),
                    notice: Some(Notice::warning("⚠️ Select both importance and urgency (1-4)")),
                }
            }
        }
    }

    /// Answer store requests locally and forward the rest to the page.
    pub async fn handle(&self, request: Request) -> Response {
        let action = request.action();
        let result = match request {
            Request::GetPriorities {} => self
                .store
                .get_all(ItemKind::Email)
                .await
                .map(|priorities| Response::Priorities { priorities }),
            Request::ExportData {} => self.export().await,
            Request::RenameLabel { kind, id, label } => self
                .store
                .patch_label(kind, &id, label)
                .await
                .map(|applied| Response::Renamed { id, applied }),
            Request::DeletePriority { kind, id } => {
                self.store
                    .delete(kind, &id)
                    .await
                    .map(|removed| Response::Removed {
                        id: removed.then_some(id),
                        notice: Some(Notice::success("✅ Priority removed")),
                    })
            }
            other => return self.forward(other).await,
        };
        result.unwrap_or_else(|err| {
            warn!("store request failed (action={action}, error={err})");
            Response::failed(err.to_string())
        })
    }

    /// Both namespaces regrouped by quadrant.
    pub async fn matrix(&self) -> Result<Matrix, EisenhowerError> {
        let emails = self.store.get_all(ItemKind::Email).await?;
        let web_links = self.store.get_all(ItemKind::WebPage).await?;
        let records = emails
            .values()
            .map(|record| (ItemKind::Email, record))
            .chain(web_links.values().map(|record| (ItemKind::WebPage, record)));
        Ok(Matrix::build(records, &self.cleaner))
    }

    async fn export(&self) -> Result<Response, eisenhower_rs_store::StoreError> {
        Ok(Response::Export {
            emails: self.store.get_all(ItemKind::Email).await?,
            web_links: self.store.get_all(ItemKind::WebPage).await?,
        })
    }

    async fn is_mail_host(&self, tab_url: &str) -> bool {
        let Some(host) = Url::parse(tab_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
        else {
            return false;
        };
        let custom = match self.store.load_settings().await {
            Ok(settings) => settings.custom_exchange_urls,
            Err(err) => {
                warn!("settings unavailable, using builtin hosts (error={err})");
                Vec::new()
            }
        };
        HostAllowList::new(&self.builtin_hosts, &custom).is_allowed(&host)
    }

    async fn forward(&self, request: Request) -> Response {
        let action = request.action();
        match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!("page did not answer (action={action}, error={err})");
                Response::Failed {
                    error: err.to_string(),
                    notice: Some(Notice::error("❌ The page did not respond, reload it and try again")),
                }
            }
        }
    }
}

/// Both ratings must be chosen and within 1..=4.
pub fn validate_ratings(
    importance: Option<i32>,
    urgency: Option<i32>,
) -> Result<(i32, i32), EisenhowerError> {
    let (Some(importance), Some(urgency)) = (importance, urgency) else {
        return Err(EisenhowerError::InvalidRating(
            "importance and urgency must both be selected".to_string(),
        ));
    };
    for (name, value) in [("importance", importance), ("urgency", urgency)] {
        if !RATING_RANGE.contains(&value) {
            return Err(EisenhowerError::InvalidRating(format!(
                "{name} must be between 1 and 4, got {value}"
            )));
        }
    }
    Ok((importance, urgency))
}

#[cfg(test)]
mod tests {
    use super::{MenuItem, validate_ratings};
    use eisenhower_rs_protocol::Preset;
    use pretty_assertions::assert_eq;

    #[test]
    fn menu_ids_resolve() {
        for item in MenuItem::ALL {
            assert_eq!(MenuItem::from_id(item.id()), Some(item));
        }
        assert_eq!(
            MenuItem::Preset(Preset::Schedule).title(),
            "🟡 Schedule (important, not urgent)"
        );
        assert_eq!(MenuItem::from_id("separator"), None);
    }

    #[test]
    fn picker_needs_both_ratings_in_range() {
        assert_eq!(validate_ratings(Some(4), Some(1)).expect("valid"), (4, 1));
        assert!(validate_ratings(None, Some(2)).is_err());
        assert!(validate_ratings(Some(5), Some(2)).is_err());
        assert!(validate_ratings(Some(3), Some(0)).is_err());
    }
}

//! Identifier conflict detection and the install decision boundary
//!
//! [`resolve`] is pure: it looks at the catalog and the managed store and
//! either settles the disposition on its own (nothing collides) or builds a
//! [`ConflictRequest`] listing one install-as-new option followed by one
//! replace option per catalogued app sharing the identifier.
//!
//! A request is answered by a [`DecisionResponder`]. The answer is the index of
//! the chosen option, or `None` to cancel the install.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::domain::InstalledApp;
use crate::error::{Result, SideloadError};
use crate::locator::BUNDLE_SUFFIX;

/// Where an incoming bundle goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallDisposition {
    /// Install at a path no other bundle uses
    InstallAsNew { relative_path: String },
    /// Take over the path (and data folder) of an installed app
    Replace { target: InstalledApp },
}

impl InstallDisposition {
    /// Path inside the managed store the bundle will occupy
    pub fn relative_path(&self) -> &str {
        match self {
            InstallDisposition::InstallAsNew { relative_path } => relative_path,
            InstallDisposition::Replace { target } => &target.relative_path,
        }
    }

    pub fn replaced(&self) -> Option<&InstalledApp> {
        match self {
            InstallDisposition::InstallAsNew { .. } => None,
            InstallDisposition::Replace { target } => Some(target),
        }
    }

    /// One-line description for prompts
    pub fn label(&self) -> String {
        match self {
            InstallDisposition::InstallAsNew { relative_path } => {
                format!("Install as new ({relative_path})")
            }
            InstallDisposition::Replace { target } => match &target.data_uuid {
                Some(uuid) => format!("Replace {} (data {uuid})", target.relative_path),
                None => format!("Replace {}", target.relative_path),
            },
        }
    }
}

/// Options presented when an identifier collides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRequest {
    pub identifier: String,
    /// Install-as-new first, then one replace option per matching app
    pub options: Vec<InstallDisposition>,
}

impl ConflictRequest {
    /// Turn an answer into the chosen disposition
    pub fn choose(&self, index: usize) -> Result<InstallDisposition> {
        self.options
            .get(index)
            .cloned()
            .ok_or(SideloadError::InvalidDecision {
                index,
                count: self.options.len(),
            })
    }
}

/// Outcome of conflict detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No collision; install at the canonical path without asking
    Immediate(InstallDisposition),
    /// A decision is required
    NeedsDecision(ConflictRequest),
}

/// Canonical store path for an identifier
pub fn canonical_path(identifier: &str) -> String {
    format!("{identifier}{BUNDLE_SUFFIX}")
}

/// Detect collisions for `identifier` against `catalog` and the store at `bundle_root`.
///
/// `stamp` seeds the suffix of the disambiguated fallback path (the install
/// uses the current unix time); it is bumped until the path is free both on
/// disk and in the catalog.
pub fn resolve(identifier: &str, catalog: &[InstalledApp], bundle_root: &Path, stamp: i64) -> Resolution {
    let canonical = canonical_path(identifier);
    let on_disk = bundle_root.join(&canonical).symlink_metadata().is_ok();
    let matches: Vec<&InstalledApp> = catalog
        .iter()
        .filter(|app| app.identifier == identifier)
        .collect();

    if !on_disk && matches.is_empty() {
        return Resolution::Immediate(InstallDisposition::InstallAsNew {
            relative_path: canonical,
        });
    }

    let mut options = vec![InstallDisposition::InstallAsNew {
        relative_path: disambiguated_path(identifier, catalog, bundle_root, stamp),
    }];
    options.extend(matches.into_iter().map(|app| InstallDisposition::Replace {
        target: app.clone(),
    }));

    Resolution::NeedsDecision(ConflictRequest {
        identifier: identifier.to_string(),
        options,
    })
}

fn disambiguated_path(identifier: &str, catalog: &[InstalledApp], bundle_root: &Path, stamp: i64) -> String {
    let taken = |candidate: &str| {
        bundle_root.join(candidate).symlink_metadata().is_ok()
            || catalog.iter().any(|app| app.relative_path == candidate)
    };

    let mut suffix = stamp;
    loop {
        let candidate = format!("{identifier}_{suffix}{BUNDLE_SUFFIX}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix = suffix.wrapping_add(1);
    }
}

/// Answers conflict requests, typically by asking a human
#[async_trait]
pub trait DecisionResponder: Send + Sync {
    /// Index of the chosen option, or `None` to cancel
    async fn decide(&self, request: &ConflictRequest) -> Result<Option<usize>>;
}

/// A request in flight on a [`decision_channel`]
#[derive(Debug)]
pub struct PendingDecision {
    pub request: ConflictRequest,
    reply: oneshot::Sender<Option<usize>>,
}

impl PendingDecision {
    /// Send the answer back to the waiting install
    pub fn respond(self, choice: Option<usize>) {
        if self.reply.send(choice).is_err() {
            warn!(identifier = %self.request.identifier, "install stopped waiting for a decision");
        }
    }
}

/// Responder that forwards requests to whoever holds the receiving end
#[derive(Debug, Clone)]
pub struct ChannelResponder {
    requests: mpsc::Sender<PendingDecision>,
}

/// Create a responder and the receiver a presenter reads requests from.
///
/// If the presenter goes away without answering, the install is cancelled.
pub fn decision_channel(buffer: usize) -> (ChannelResponder, mpsc::Receiver<PendingDecision>) {
    let (requests, receiver) = mpsc::channel(buffer.max(1));
    (ChannelResponder { requests }, receiver)
}

#[async_trait]
impl DecisionResponder for ChannelResponder {
    async fn decide(&self, request: &ConflictRequest) -> Result<Option<usize>> {
        let (reply, answer) = oneshot::channel();
        let pending = PendingDecision {
            request: request.clone(),
            reply,
        };

        if self.requests.send(pending).await.is_err() {
            warn!(identifier = %request.identifier, "no decision presenter, cancelling");
            return Ok(None);
        }

        Ok(answer.await.unwrap_or(None))
    }
}

/// Fixed answer for unattended installs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Always install as new
    InstallAsNew,
    /// Replace the first matching app, or install as new when none matches
    ReplaceFirst,
    /// Cancel on any conflict
    Cancel,
}

#[async_trait]
impl DecisionResponder for ConflictPolicy {
    async fn decide(&self, request: &ConflictRequest) -> Result<Option<usize>> {
        Ok(match self {
            ConflictPolicy::InstallAsNew => Some(0),
            ConflictPolicy::ReplaceFirst => Some(if request.options.len() > 1 { 1 } else { 0 }),
            ConflictPolicy::Cancel => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackageManifest;
    use std::fs;
    use tempfile::TempDir;

    fn app(identifier: &str, path: &str) -> InstalledApp {
        let manifest = PackageManifest {
            identifier: identifier.to_string(),
            display_name: identifier.to_string(),
            url_schemes: std::collections::BTreeSet::new(),
        };
        InstalledApp::from_manifest(&manifest, path)
    }

    #[test]
    fn test_no_conflict_is_immediate_canonical() {
        let temp = TempDir::new().unwrap();
        let catalog = vec![app("other.id", "other.id.app")];

        let resolution = resolve("com.example.new", &catalog, temp.path(), 1_700_000_000);
        assert_eq!(
            resolution,
            Resolution::Immediate(InstallDisposition::InstallAsNew {
                relative_path: "com.example.new.app".to_string()
            })
        );
    }

    #[test]
    fn test_catalog_match_offers_new_and_replace() {
        let temp = TempDir::new().unwrap();
        let catalog = vec![
            app("com.x", "com.x.app"),
            app("other", "other.app"),
            app("com.x", "com.x_1.app"),
        ];

        let Resolution::NeedsDecision(request) = resolve("com.x", &catalog, temp.path(), 5) else {
            panic!("expected a decision");
        };
        assert_eq!(request.options.len(), 3);
        assert_eq!(
            request.options[0],
            InstallDisposition::InstallAsNew {
                relative_path: "com.x_5.app".to_string()
            }
        );
        assert_eq!(request.options[1].relative_path(), "com.x.app");
        assert_eq!(request.options[2].relative_path(), "com.x_1.app");
    }

    #[test]
    fn test_existing_directory_alone_forces_decision() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("com.x.app")).unwrap();

        let Resolution::NeedsDecision(request) = resolve("com.x", &[], temp.path(), 9) else {
            panic!("expected a decision");
        };
        assert_eq!(request.options.len(), 1);
        assert!(request.options[0].replaced().is_none());
    }

    #[test]
    fn test_fallback_path_skips_taken_names() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("com.x.app")).unwrap();
        fs::create_dir_all(temp.path().join("com.x_100.app")).unwrap();
        let catalog = vec![app("com.x", "com.x_101.app")];

        let Resolution::NeedsDecision(request) = resolve("com.x", &catalog, temp.path(), 100) else {
            panic!("expected a decision");
        };
        assert_eq!(request.options[0].relative_path(), "com.x_102.app");
    }

    #[test]
    fn test_choose_out_of_range() {
        let request = ConflictRequest {
            identifier: "a".to_string(),
            options: vec![InstallDisposition::InstallAsNew {
                relative_path: "a_1.app".to_string(),
            }],
        };
        assert!(request.choose(0).is_ok());
        assert!(matches!(
            request.choose(3),
            Err(SideloadError::InvalidDecision { index: 3, count: 1 })
        ));
    }

    #[tokio::test]
    async fn test_channel_responder_round_trip() {
        let (responder, mut requests) = decision_channel(1);
        let presenter = tokio::spawn(async move {
            let pending = requests.recv().await.unwrap();
            assert_eq!(pending.request.identifier, "com.x");
            pending.respond(Some(1));
        });

        let request = ConflictRequest {
            identifier: "com.x".to_string(),
            options: vec![],
        };
        assert_eq!(responder.decide(&request).await.unwrap(), Some(1));
        presenter.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_responder_cancels_when_presenter_gone() {
        let (responder, requests) = decision_channel(1);
        drop(requests);

        let request = ConflictRequest {
            identifier: "com.x".to_string(),
            options: vec![],
        };
        assert_eq!(responder.decide(&request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_channel_responder_cancels_on_dropped_reply() {
        let (responder, mut requests) = decision_channel(1);
        tokio::spawn(async move {
            let pending = requests.recv().await.unwrap();
            drop(pending);
        });

        let request = ConflictRequest {
            identifier: "com.x".to_string(),
            options: vec![],
        };
        assert_eq!(responder.decide(&request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_policies() {
        let request = ConflictRequest {
            identifier: "a".to_string(),
            options: vec![
                InstallDisposition::InstallAsNew {
                    relative_path: "a_1.app".to_string(),
                },
                InstallDisposition::Replace {
                    target: app("a", "a.app"),
                },
            ],
        };
        assert_eq!(ConflictPolicy::InstallAsNew.decide(&request).await.unwrap(), Some(0));
        assert_eq!(ConflictPolicy::ReplaceFirst.decide(&request).await.unwrap(), Some(1));
        assert_eq!(ConflictPolicy::Cancel.decide(&request).await.unwrap(), None);
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package metadata resolution for plugkit
//!
//! Given a package identifier, determine its artifact URL and kind by
//! consulting the remote registry, the caller's entitlements, and the
//! cached update data. A package is served by exactly one of two
//! distribution channels:
//!
//! - **self-hosted**: the registry supplies a direct public link, used
//!   verbatim;
//! - **entitled**: the caller must hold an active entitlement, and the
//!   artifact URL comes from the cached update data.
//!
//! The resolver never falls back from one channel to the other: missing
//! data in the expected channel is a hard failure for that package.

use tracing::debug;

use plugkit_errors::{Error, InstallError, RegistryError, Result};
use plugkit_events::{AppEvent, EventEmitter, EventSender, ResolverEvent};
use plugkit_registry::{EntitlementVerifier, RegistryLookup, UpdateSource};
use plugkit_types::{Channel, PackageId};

/// Outcome of metadata resolution for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub download_url: String,
    pub kind: String,
    pub channel: Channel,
    /// Expected blake3 digest, when the update cache publishes one
    pub checksum: Option<String>,
}

/// Metadata resolver over the three registry collaborators
pub struct MetadataResolver<L, E, U> {
    registry: L,
    entitlements: E,
    updates: U,
    event_sender: Option<EventSender>,
}

impl<L, E, U> MetadataResolver<L, E, U>
where
    L: RegistryLookup,
    E: EntitlementVerifier,
    U: UpdateSource,
{
    pub fn new(registry: L, entitlements: E, updates: U) -> Self {
        Self {
            registry,
            entitlements,
            updates,
            event_sender: None,
        }
    }

    /// Attach an event sender for resolution events
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.event_sender = Some(tx);
        self
    }

    /// Resolve one package's artifact URL, kind, and channel
    ///
    /// # Errors
    ///
    /// Returns an error if the registry has no such package, a
    /// self-hosted entry carries no link, the caller lacks an
    /// entitlement for a gated package, or the update cache has no
    /// artifact for an entitled one.
    pub async fn resolve(&self, id: &PackageId) -> Result<ResolvedMetadata> {
        match self.resolve_inner(id).await {
            Ok(resolved) => {
                self.emit(AppEvent::Resolver(ResolverEvent::Resolved {
                    package: id.clone(),
                    channel: resolved.channel,
                    kind: resolved.kind.clone(),
                }));
                Ok(resolved)
            }
            Err(e) => {
                self.emit(AppEvent::Resolver(ResolverEvent::Failed {
                    package: id.clone(),
                    error: e.to_string(),
                }));
                Err(e)
            }
        }
    }

    async fn resolve_inner(&self, id: &PackageId) -> Result<ResolvedMetadata> {
        let entry = self.registry.lookup(id).await?;

        if entry.self_hosted {
            // Freely hosted channel: the registry's link is used verbatim.
            let Some(download_url) = entry.download_url else {
                return Err(Error::Registry(RegistryError::MissingDownloadUrl {
                    package: id.to_string(),
                }));
            };

            debug!(package = %id, channel = %Channel::SelfHosted, "resolved metadata");
            return Ok(ResolvedMetadata {
                download_url,
                kind: entry.kind,
                channel: Channel::SelfHosted,
                checksum: None,
            });
        }

        // Entitlement-gated channel: the registry link, even if present,
        // is never consulted here.
        if !self.entitlements.is_entitled(id).await? {
            return Err(Error::Install(InstallError::MissingEntitlement {
                package: id.to_string(),
            }));
        }

        let Some(update) = self.updates.get(id).await? else {
            return Err(Error::Install(InstallError::MissingPackage {
                package: id.to_string(),
            }));
        };

        debug!(package = %id, channel = %Channel::Entitled, version = %update.version, "resolved metadata");
        Ok(ResolvedMetadata {
            download_url: update.artifact_url,
            kind: entry.kind,
            channel: Channel::Entitled,
            checksum: update.checksum,
        })
    }
}

impl<L, E, U> EventEmitter for MetadataResolver<L, E, U> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugkit_registry::{RegistryEntry, UpdateEntry};
    use semver::Version;

    struct StubRegistry {
        entry: RegistryEntry,
    }

    impl RegistryLookup for StubRegistry {
        async fn lookup(&self, _id: &PackageId) -> Result<RegistryEntry> {
            Ok(self.entry.clone())
        }
    }

    struct StubEntitlements {
        entitled: bool,
    }

    impl EntitlementVerifier for StubEntitlements {
        async fn is_entitled(&self, _id: &PackageId) -> Result<bool> {
            Ok(self.entitled)
        }
    }

    struct StubUpdates {
        entry: Option<UpdateEntry>,
    }

    impl UpdateSource for StubUpdates {
        async fn get(&self, _id: &PackageId) -> Result<Option<UpdateEntry>> {
            Ok(self.entry.clone())
        }
    }

    fn entry(self_hosted: bool, download_url: Option<&str>) -> RegistryEntry {
        RegistryEntry {
            id: PackageId::from("acme-seo"),
            kind: "plugin".to_string(),
            self_hosted,
            download_url: download_url.map(str::to_string),
        }
    }

    fn update(url: &str) -> UpdateEntry {
        UpdateEntry {
            artifact_url: url.to_string(),
            version: Version::new(2, 1, 0),
            checksum: Some("ab".repeat(32)),
        }
    }

    fn resolver(
        registry: RegistryEntry,
        entitled: bool,
        cached: Option<UpdateEntry>,
    ) -> MetadataResolver<StubRegistry, StubEntitlements, StubUpdates> {
        MetadataResolver::new(
            StubRegistry { entry: registry },
            StubEntitlements { entitled },
            StubUpdates { entry: cached },
        )
    }

    #[tokio::test]
    async fn test_self_hosted_uses_registry_link_verbatim() {
        let r = resolver(
            entry(true, Some("https://cdn.example.test/acme-seo.tar.gz")),
            false,
            None,
        );

        let resolved = r.resolve(&PackageId::from("acme-seo")).await.unwrap();
        assert_eq!(resolved.channel, Channel::SelfHosted);
        assert_eq!(resolved.download_url, "https://cdn.example.test/acme-seo.tar.gz");
        assert_eq!(resolved.kind, "plugin");
        assert!(resolved.checksum.is_none());
    }

    #[tokio::test]
    async fn test_self_hosted_without_link_is_hard_failure() {
        // Even a valid update cache entry must not rescue a broken
        // self-hosted registry entry.
        let r = resolver(
            entry(true, None),
            true,
            Some(update("https://updates.example.test/acme-seo.tar.gz")),
        );

        let err = r.resolve(&PackageId::from("acme-seo")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::MissingDownloadUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_gated_package_without_entitlement_fails() {
        // The registry entry carries a link that would work if the
        // resolver wrongly fell back to the self-hosted channel.
        let r = resolver(
            entry(false, Some("https://cdn.example.test/acme-seo.tar.gz")),
            false,
            Some(update("https://updates.example.test/acme-seo.tar.gz")),
        );

        let err = r.resolve(&PackageId::from("acme-seo")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Install(InstallError::MissingEntitlement { .. })
        ));
    }

    #[tokio::test]
    async fn test_entitled_package_uses_cached_artifact() {
        let r = resolver(
            entry(false, Some("https://cdn.example.test/wrong-channel.tar.gz")),
            true,
            Some(update("https://updates.example.test/acme-seo-2.1.0.tar.gz")),
        );

        let resolved = r.resolve(&PackageId::from("acme-seo")).await.unwrap();
        assert_eq!(resolved.channel, Channel::Entitled);
        assert_eq!(
            resolved.download_url,
            "https://updates.example.test/acme-seo-2.1.0.tar.gz"
        );
        assert!(resolved.checksum.is_some());
    }

    #[tokio::test]
    async fn test_entitled_package_without_cached_artifact_fails() {
        let r = resolver(
            entry(false, Some("https://cdn.example.test/wrong-channel.tar.gz")),
            true,
            None,
        );

        let err = r.resolve(&PackageId::from("acme-seo")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Install(InstallError::MissingPackage { .. })
        ));
    }
}

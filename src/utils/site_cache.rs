use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::model::project_site::ProjectSite;
use crate::store::SiteDirectory;
use crate::writer::BackendError;

/// TTL cache in front of a site directory. Only hits are cached.
pub struct CachedSites {
    inner: Arc<dyn SiteDirectory>,
    cache: Cache<u64, ProjectSite>,
}

impl CachedSites {
    pub fn new(inner: Arc<dyn SiteDirectory>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl SiteDirectory for CachedSites {
    async fn find_site(&self, id: u64) -> Result<Option<ProjectSite>, BackendError> {
        if let Some(site) = self.cache.get(&id).await {
            return Ok(Some(site));
        }

        let site = self.inner.find_site(id).await?;
        if let Some(site) = &site {
            self.cache.insert(id, site.clone()).await;
        }
        Ok(site)
    }

    /// Always hits the directory and refreshes the cache.
    async fn list_sites(&self) -> Result<Vec<ProjectSite>, BackendError> {
        let sites = self.inner.list_sites().await?;

        let inserts: Vec<_> = sites
            .iter()
            .map(|site| self.cache.insert(site.id, site.clone()))
            .collect();
        futures::future::join_all(inserts).await;

        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl SiteDirectory for Counting {
        async fn find_site(&self, id: u64) -> Result<Option<ProjectSite>, BackendError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok((id == 1).then(|| ProjectSite {
                id: 1,
                title: "Main Office".into(),
                latitude: Some(1.0),
                longitude: Some(1.0),
                radius_meters: 100.0,
            }))
        }

        async fn list_sites(&self) -> Result<Vec<ProjectSite>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn hits_are_served_from_cache() {
        let inner = Arc::new(Counting {
            lookups: AtomicUsize::new(0),
        });
        let sites = CachedSites::new(inner.clone(), Duration::from_secs(60));

        assert!(sites.find_site(1).await.unwrap().is_some());
        assert!(sites.find_site(1).await.unwrap().is_some());
        assert_eq!(inner.lookups.load(Ordering::SeqCst), 1);

        assert!(sites.find_site(2).await.unwrap().is_none());
        assert!(sites.find_site(2).await.unwrap().is_none());
        assert_eq!(inner.lookups.load(Ordering::SeqCst), 3);
    }
}

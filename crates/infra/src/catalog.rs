//! Catalog mutation service: items, packages, combos and alerts.
//!
//! Payloads are validated before any store call. Each tenant's item list is
//! cached as an immutable [`ItemList`] snapshot that only changes after the
//! store has confirmed a write.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use neurocore_core::{DomainError, FieldErrors, RecordId, TenantId, UserId};
use neurocore_inventory::{
    ComboComponent, ComboHeader, ComboHeaderPatch, ComboRecord, InventoryAlert, InventoryItem,
    InventoryItemPatch, ItemList, NewCombo, NewInventoryAlert, NewInventoryItem, NewPackage,
    PackageDefinition, PackagePatch,
};

use crate::error::ServiceError;
use crate::images::{ImageStore, ImageUpload, image_path};
use crate::store::{DynStore, InMemoryTenantStore, PostgresTenantStore, StoreError};

/// A confirmed write, plus the reason an accompanying image was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub record: T,
    pub image_error: Option<String>,
}

/// Backing collections of the catalog.
#[derive(Clone)]
pub struct CatalogStores {
    pub items: DynStore<RecordId, InventoryItem>,
    pub packages: DynStore<RecordId, PackageDefinition>,
    pub combo_headers: DynStore<RecordId, ComboHeader>,
    pub combo_components: DynStore<RecordId, ComboComponent>,
    pub alerts: DynStore<RecordId, InventoryAlert>,
}

impl CatalogStores {
    pub fn in_memory() -> Self {
        Self {
            items: Arc::new(InMemoryTenantStore::new()),
            packages: Arc::new(InMemoryTenantStore::new()),
            combo_headers: Arc::new(InMemoryTenantStore::new()),
            combo_components: Arc::new(InMemoryTenantStore::new()),
            alerts: Arc::new(InMemoryTenantStore::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            items: Arc::new(PostgresTenantStore::new(pool.clone(), "inventory_items")),
            packages: Arc::new(PostgresTenantStore::new(pool.clone(), "inventory_packages")),
            combo_headers: Arc::new(PostgresTenantStore::new(pool.clone(), "combo_headers")),
            combo_components: Arc::new(PostgresTenantStore::new(pool.clone(), "combo_components")),
            alerts: Arc::new(PostgresTenantStore::new(pool, "inventory_alerts")),
        }
    }
}

/// Per-tenant item snapshots plus a write counter per tenant.
///
/// Every confirmed item write bumps the tenant's generation, cached or not; a
/// store load only gets installed if no write landed while it was in flight.
#[derive(Default)]
struct ItemCache {
    lists: HashMap<TenantId, ItemList<InventoryItem>>,
    generations: HashMap<TenantId, u64>,
}

impl ItemCache {
    fn generation(&self, tenant_id: TenantId) -> u64 {
        self.generations.get(&tenant_id).copied().unwrap_or(0)
    }

    fn bump(&mut self, tenant_id: TenantId) {
        *self.generations.entry(tenant_id).or_insert(0) += 1;
    }
}

pub struct CatalogService {
    stores: CatalogStores,
    images: Arc<dyn ImageStore>,
    item_cache: RwLock<ItemCache>,
}

impl CatalogService {
    pub fn new(stores: CatalogStores, images: Arc<dyn ImageStore>) -> Self {
        Self {
            stores,
            images,
            item_cache: RwLock::new(ItemCache::default()),
        }
    }

    pub fn stores(&self) -> &CatalogStores {
        &self.stores
    }

    // ---- items -------------------------------------------------------------

    /// Current item snapshot for a tenant, loaded from the store on first use.
    ///
    /// A load that raced a confirmed write is discarded and retried.
    pub async fn items(&self, tenant_id: TenantId) -> Result<ItemList<InventoryItem>, ServiceError> {
        loop {
            let generation = {
                let cache = self.item_cache.read().map_err(|_| StoreError::Poisoned)?;
                if let Some(list) = cache.lists.get(&tenant_id) {
                    return Ok(list.clone());
                }
                cache.generation(tenant_id)
            };

            let loaded = ItemList::from(self.stores.items.list(tenant_id).await?);

            let mut cache = self.item_cache.write().map_err(|_| StoreError::Poisoned)?;
            if let Some(list) = cache.lists.get(&tenant_id) {
                return Ok(list.clone());
            }
            if cache.generation(tenant_id) == generation {
                cache.lists.insert(tenant_id, loaded.clone());
                return Ok(loaded);
            }
            tracing::debug!(tenant_id = %tenant_id, "item load raced a write; reloading");
        }
    }

    /// Swap the tenant's snapshot for `update(snapshot)` and bump its
    /// generation. A tenant that was never loaded keeps no snapshot; the next
    /// read loads it from the store.
    fn apply_to_cache(
        &self,
        tenant_id: TenantId,
        update: impl FnOnce(&ItemList<InventoryItem>) -> ItemList<InventoryItem>,
    ) {
        match self.item_cache.write() {
            Ok(mut cache) => {
                cache.bump(tenant_id);
                if let Some(list) = cache.lists.get_mut(&tenant_id) {
                    *list = update(list);
                }
            }
            Err(poisoned) => {
                tracing::warn!(tenant_id = %tenant_id, "item cache poisoned; dropping tenant snapshot");
                let mut cache = poisoned.into_inner();
                cache.bump(tenant_id);
                cache.lists.remove(&tenant_id);
            }
        }
    }

    async fn ensure_unique_sku(
        &self,
        tenant_id: TenantId,
        sku: &str,
        except: Option<RecordId>,
    ) -> Result<(), ServiceError> {
        let items = self.items(tenant_id).await?;
        let taken = items
            .as_slice()
            .iter()
            .any(|item| item.sku == sku && Some(item.id) != except);
        if taken {
            return Err(DomainError::conflict(format!("sku '{sku}' already exists")).into());
        }
        Ok(())
    }

    /// Upload an image if one was supplied. Failures are logged and reported
    /// back; the mutation itself goes ahead without the image.
    async fn upload_image(
        &self,
        tenant_id: TenantId,
        sku: &str,
        image: Option<ImageUpload>,
        now: DateTime<Utc>,
    ) -> (Option<String>, Option<String>) {
        let Some(image) = image else {
            return (None, None);
        };
        let path = image_path(sku, &image, now);
        match self.images.put(tenant_id, &path, &image).await {
            Ok(url) => (Some(url), None),
            Err(e) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    sku,
                    path = %path,
                    error = %e,
                    "image upload failed; saving item without image"
                );
                (None, Some(e.to_string()))
            }
        }
    }

    pub async fn create_item(
        &self,
        tenant_id: TenantId,
        payload: NewInventoryItem,
        image: Option<ImageUpload>,
        now: DateTime<Utc>,
    ) -> Result<Saved<InventoryItem>, ServiceError> {
        payload.validate()?;
        self.ensure_unique_sku(tenant_id, payload.sku.trim(), None).await?;

        let (image_url, image_error) = self.upload_image(tenant_id, payload.sku.trim(), image, now).await;
        let mut item = payload.into_item(RecordId::new(), now);
        if image_url.is_some() {
            item.image_url = image_url;
        }

        self.stores.items.upsert(tenant_id, item.id, item.clone()).await?;
        self.apply_to_cache(tenant_id, |list| list.appended(item.clone()));

        tracing::info!(tenant_id = %tenant_id, item_id = %item.id, sku = %item.sku, "inventory item created");
        Ok(Saved { record: item, image_error })
    }

    pub async fn update_item(
        &self,
        tenant_id: TenantId,
        id: RecordId,
        patch: InventoryItemPatch,
        image: Option<ImageUpload>,
        now: DateTime<Utc>,
    ) -> Result<Saved<InventoryItem>, ServiceError> {
        patch.validate()?;
        let current = self
            .stores
            .items
            .get(tenant_id, &id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if let Some(sku) = patch.sku() {
            if sku != current.sku {
                self.ensure_unique_sku(tenant_id, sku, Some(id)).await?;
            }
        }

        let sku = patch.sku().unwrap_or(&current.sku).to_string();
        let (image_url, image_error) = self.upload_image(tenant_id, &sku, image, now).await;
        let mut item = current.patched(patch, now);
        if image_url.is_some() {
            item.image_url = image_url;
        }

        self.stores.items.upsert(tenant_id, id, item.clone()).await?;
        self.apply_to_cache(tenant_id, |list| list.replaced(item.clone()));

        tracing::info!(tenant_id = %tenant_id, item_id = %id, "inventory item updated");
        Ok(Saved { record: item, image_error })
    }

    /// Delete an item. Items still referenced by a package or combo are kept.
    pub async fn delete_item(&self, tenant_id: TenantId, id: RecordId) -> Result<InventoryItem, ServiceError> {
        let packages = self.stores.packages.list(tenant_id).await?;
        let components = self.stores.combo_components.list(tenant_id).await?;
        let referenced = packages.iter().any(|p| p.base_item_id == id)
            || components.iter().any(|c| c.component_item_id == id);
        if referenced {
            return Err(DomainError::conflict("item is referenced by a package or combo").into());
        }

        let removed = self
            .stores
            .items
            .remove(tenant_id, &id)
            .await?
            .ok_or(DomainError::NotFound)?;
        self.apply_to_cache(tenant_id, |list| list.removed(&id));

        tracing::info!(tenant_id = %tenant_id, item_id = %id, "inventory item deleted");
        Ok(removed)
    }

    /// Field errors for every referenced item id that does not exist.
    async fn missing_items(
        &self,
        tenant_id: TenantId,
        refs: impl IntoIterator<Item = (String, RecordId)>,
    ) -> Result<FieldErrors, ServiceError> {
        let items = self.items(tenant_id).await?;
        let mut errors = FieldErrors::new();
        for (field, id) in refs {
            if items.get(&id).is_none() {
                errors.add(field, "unknown inventory item");
            }
        }
        Ok(errors)
    }

    // ---- packages ----------------------------------------------------------

    pub async fn packages(&self, tenant_id: TenantId) -> Result<Vec<PackageDefinition>, ServiceError> {
        Ok(self.stores.packages.list(tenant_id).await?)
    }

    pub async fn create_package(
        &self,
        tenant_id: TenantId,
        payload: NewPackage,
    ) -> Result<PackageDefinition, ServiceError> {
        payload.validate()?;
        self.missing_items(tenant_id, [("base_item_id".to_string(), payload.base_item_id)])
            .await?
            .into_result()?;

        let package = payload.into_package(RecordId::new());
        self.stores.packages.upsert(tenant_id, package.id, package.clone()).await?;
        tracing::info!(tenant_id = %tenant_id, package_id = %package.id, "package created");
        Ok(package)
    }

    pub async fn update_package(
        &self,
        tenant_id: TenantId,
        id: RecordId,
        patch: PackagePatch,
    ) -> Result<PackageDefinition, ServiceError> {
        patch.validate()?;
        let current = self
            .stores
            .packages
            .get(tenant_id, &id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if let Some(base_item_id) = patch.base_item_id {
            self.missing_items(tenant_id, [("base_item_id".to_string(), base_item_id)])
                .await?
                .into_result()?;
        }

        let package = current.patched(patch);
        self.stores.packages.upsert(tenant_id, id, package.clone()).await?;
        tracing::info!(tenant_id = %tenant_id, package_id = %id, "package updated");
        Ok(package)
    }

    pub async fn delete_package(&self, tenant_id: TenantId, id: RecordId) -> Result<PackageDefinition, ServiceError> {
        let removed = self
            .stores
            .packages
            .remove(tenant_id, &id)
            .await?
            .ok_or(DomainError::NotFound)?;
        tracing::info!(tenant_id = %tenant_id, package_id = %id, "package deleted");
        Ok(removed)
    }

    // ---- combos ------------------------------------------------------------

    /// Every combo with its components, in header order.
    pub async fn combos(&self, tenant_id: TenantId) -> Result<Vec<ComboRecord>, ServiceError> {
        let headers = self.stores.combo_headers.list(tenant_id).await?;
        let mut by_combo: HashMap<RecordId, Vec<ComboComponent>> = HashMap::new();
        for component in self.stores.combo_components.list(tenant_id).await? {
            by_combo.entry(component.combo_id).or_default().push(component);
        }
        Ok(headers
            .into_iter()
            .map(|header| {
                let components = by_combo.remove(&header.id).unwrap_or_default();
                ComboRecord { header, components }
            })
            .collect())
    }

    async fn components_of(&self, tenant_id: TenantId, combo_id: RecordId) -> Result<Vec<ComboComponent>, ServiceError> {
        let all = self.stores.combo_components.list(tenant_id).await?;
        Ok(all.into_iter().filter(|c| c.combo_id == combo_id).collect())
    }

    pub async fn create_combo(&self, tenant_id: TenantId, payload: NewCombo) -> Result<ComboRecord, ServiceError> {
        payload.validate()?;
        let refs = payload
            .components
            .iter()
            .enumerate()
            .map(|(idx, c)| (format!("components[{idx}].component_item_id"), c.component_item_id))
            .collect::<Vec<_>>();
        self.missing_items(tenant_id, refs).await?.into_result()?;

        let record = payload.into_record(RecordId::new());
        self.stores
            .combo_headers
            .upsert(tenant_id, record.header.id, record.header.clone())
            .await?;
        for component in &record.components {
            self.stores
                .combo_components
                .upsert(tenant_id, component.id, component.clone())
                .await?;
        }

        tracing::info!(
            tenant_id = %tenant_id,
            combo_id = %record.header.id,
            components = record.components.len(),
            "combo created"
        );
        Ok(record)
    }

    /// Patch a combo header. A `components` list replaces the existing set.
    pub async fn update_combo(
        &self,
        tenant_id: TenantId,
        id: RecordId,
        mut patch: ComboHeaderPatch,
    ) -> Result<ComboRecord, ServiceError> {
        patch.validate()?;
        let current = self
            .stores
            .combo_headers
            .get(tenant_id, &id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let replacement = patch.components.take();
        if let Some(new_components) = &replacement {
            let refs = new_components
                .iter()
                .enumerate()
                .map(|(idx, c)| (format!("components[{idx}].component_item_id"), c.component_item_id))
                .collect::<Vec<_>>();
            self.missing_items(tenant_id, refs).await?.into_result()?;
        }

        let header = current.patched(patch);
        self.stores.combo_headers.upsert(tenant_id, id, header.clone()).await?;

        let components = match replacement {
            Some(new_components) => {
                for old in self.components_of(tenant_id, id).await? {
                    self.stores.combo_components.remove(tenant_id, &old.id).await?;
                }
                let mut created = Vec::with_capacity(new_components.len());
                for component in new_components {
                    let component = component.into_component(RecordId::new(), id);
                    self.stores
                        .combo_components
                        .upsert(tenant_id, component.id, component.clone())
                        .await?;
                    created.push(component);
                }
                created
            }
            None => self.components_of(tenant_id, id).await?,
        };

        tracing::info!(tenant_id = %tenant_id, combo_id = %id, "combo updated");
        Ok(ComboRecord { header, components })
    }

    /// Delete a combo and all of its components.
    pub async fn delete_combo(&self, tenant_id: TenantId, id: RecordId) -> Result<ComboRecord, ServiceError> {
        if self.stores.combo_headers.get(tenant_id, &id).await?.is_none() {
            return Err(DomainError::NotFound.into());
        }

        let mut components = Vec::new();
        for component in self.components_of(tenant_id, id).await? {
            if let Some(removed) = self.stores.combo_components.remove(tenant_id, &component.id).await? {
                components.push(removed);
            }
        }
        let header = self
            .stores
            .combo_headers
            .remove(tenant_id, &id)
            .await?
            .ok_or(DomainError::NotFound)?;

        tracing::info!(
            tenant_id = %tenant_id,
            combo_id = %id,
            components = components.len(),
            "combo deleted"
        );
        Ok(ComboRecord { header, components })
    }

    // ---- alerts ------------------------------------------------------------

    pub async fn alerts(&self, tenant_id: TenantId) -> Result<Vec<InventoryAlert>, ServiceError> {
        Ok(self.stores.alerts.list(tenant_id).await?)
    }

    pub async fn create_alert(
        &self,
        tenant_id: TenantId,
        payload: NewInventoryAlert,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<InventoryAlert, ServiceError> {
        payload.validate()?;
        let alert = payload.into_alert(RecordId::new(), created_by, now);
        self.stores.alerts.upsert(tenant_id, alert.id, alert.clone()).await?;
        tracing::info!(tenant_id = %tenant_id, alert_id = %alert.id, "inventory alert created");
        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::images::{ImageStoreError, InMemoryImageStore};
    use crate::store::TenantStore;
    use tokio::sync::Notify;
    use neurocore_inventory::{ItemType, NewComboComponent};

    struct BrokenImages;

    #[async_trait::async_trait]
    impl ImageStore for BrokenImages {
        async fn put(&self, _: TenantId, _: &str, _: &ImageUpload) -> Result<String, ImageStoreError> {
            Err(ImageStoreError::Unavailable("bucket offline".into()))
        }
    }

    /// Reads work; every write fails.
    struct ReadOnlyItems(InMemoryTenantStore<RecordId, InventoryItem>);

    #[async_trait::async_trait]
    impl TenantStore<RecordId, InventoryItem> for ReadOnlyItems {
        async fn get(&self, t: TenantId, k: &RecordId) -> Result<Option<InventoryItem>, StoreError> {
            self.0.get(t, k).await
        }
        async fn upsert(&self, _: TenantId, _: RecordId, _: InventoryItem) -> Result<(), StoreError> {
            Err(StoreError::Backend {
                operation: "upsert",
                message: "read-only".into(),
            })
        }
        async fn remove(&self, _: TenantId, _: &RecordId) -> Result<Option<InventoryItem>, StoreError> {
            Err(StoreError::Backend {
                operation: "remove",
                message: "read-only".into(),
            })
        }
        async fn list(&self, t: TenantId) -> Result<Vec<InventoryItem>, StoreError> {
            self.0.list(t).await
        }
    }

    /// The first `list` snapshots the data, then parks until released.
    struct ParkedFirstList {
        inner: InMemoryTenantStore<RecordId, InventoryItem>,
        parked: Notify,
        release: Notify,
        first: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl TenantStore<RecordId, InventoryItem> for ParkedFirstList {
        async fn get(&self, t: TenantId, k: &RecordId) -> Result<Option<InventoryItem>, StoreError> {
            self.inner.get(t, k).await
        }
        async fn upsert(&self, t: TenantId, k: RecordId, v: InventoryItem) -> Result<(), StoreError> {
            self.inner.upsert(t, k, v).await
        }
        async fn remove(&self, t: TenantId, k: &RecordId) -> Result<Option<InventoryItem>, StoreError> {
            self.inner.remove(t, k).await
        }
        async fn list(&self, t: TenantId) -> Result<Vec<InventoryItem>, StoreError> {
            let snapshot = self.inner.list(t).await?;
            if self.first.swap(false, std::sync::atomic::Ordering::SeqCst) {
                self.parked.notify_one();
                self.release.notified().await;
            }
            Ok(snapshot)
        }
    }

    fn service() -> CatalogService {
        CatalogService::new(
            CatalogStores::in_memory(),
            Arc::new(InMemoryImageStore::new("https://img.local")),
        )
    }

    fn new_item(sku: &str) -> NewInventoryItem {
        NewInventoryItem {
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            category: "tools".into(),
            warehouse: "main".into(),
            status: "active".into(),
            stock: 3,
            min_stock_threshold: 5,
            rotation_rate: None,
            unit_price: Some(2.5),
            image_url: None,
            item_type: ItemType::Simple,
        }
    }

    fn png() -> Option<ImageUpload> {
        Some(ImageUpload {
            file_name: "photo.png".into(),
            bytes: vec![1, 2, 3],
        })
    }

    #[tokio::test]
    async fn create_appends_to_the_cached_list() {
        let svc = service();
        let tenant = TenantId::new();
        let first = svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap();
        let before = svc.items(tenant).await.unwrap();

        let second = svc.create_item(tenant, new_item("B"), None, Utc::now()).await.unwrap();
        let after = svc.items(tenant).await.unwrap();

        assert_eq!(before.len(), 1);
        let ids: Vec<_> = after.as_slice().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![first.record.id, second.record.id]);
    }

    #[tokio::test]
    async fn first_load_racing_a_write_never_installs_a_stale_snapshot() {
        let tenant = TenantId::new();
        let store = Arc::new(ParkedFirstList {
            inner: InMemoryTenantStore::new(),
            parked: Notify::new(),
            release: Notify::new(),
            first: std::sync::atomic::AtomicBool::new(true),
        });
        let seeded = new_item("A").into_item(RecordId::new(), Utc::now());
        store.inner.upsert(tenant, seeded.id, seeded.clone()).await.unwrap();

        let mut stores = CatalogStores::in_memory();
        stores.items = store.clone();
        let svc = Arc::new(CatalogService::new(
            stores,
            Arc::new(InMemoryImageStore::new("https://img.local")),
        ));

        let reader = tokio::spawn({
            let svc = svc.clone();
            async move { svc.items(tenant).await }
        });
        store.parked.notified().await;

        let patch = InventoryItemPatch {
            stock: Some(100),
            ..InventoryItemPatch::default()
        };
        svc.update_item(tenant, seeded.id, patch, None, Utc::now()).await.unwrap();
        store.release.notify_one();

        let seen = reader.await.unwrap().unwrap();
        assert_eq!(seen.get(&seeded.id).unwrap().stock, 100);
        let cached = svc.items(tenant).await.unwrap();
        assert_eq!(cached.get(&seeded.id).unwrap().stock, 100);
    }

    #[tokio::test]
    async fn delete_before_first_load_frees_the_sku() {
        let svc = service();
        let tenant = TenantId::new();
        let seeded = new_item("A").into_item(RecordId::new(), Utc::now());
        svc.stores().items.upsert(tenant, seeded.id, seeded.clone()).await.unwrap();

        svc.delete_item(tenant, seeded.id).await.unwrap();
        svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap();
        assert_eq!(svc.items(tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict() {
        let svc = service();
        let tenant = TenantId::new();
        svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap();

        let err = svc.create_item(tenant, new_item(" A "), None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));

        // Same sku in another tenant is fine.
        assert!(svc.create_item(TenantId::new(), new_item("A"), None, Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn update_to_a_taken_sku_is_a_conflict() {
        let svc = service();
        let tenant = TenantId::new();
        svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap();
        let b = svc.create_item(tenant, new_item("B"), None, Utc::now()).await.unwrap();

        let patch = InventoryItemPatch {
            sku: Some("A".into()),
            ..InventoryItemPatch::default()
        };
        let err = svc.update_item(tenant, b.record.id, patch, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_replaces_in_place_and_delete_removes() {
        let svc = service();
        let tenant = TenantId::new();
        let a = svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap().record;
        let b = svc.create_item(tenant, new_item("B"), None, Utc::now()).await.unwrap().record;

        let patch = InventoryItemPatch {
            stock: Some(40),
            ..InventoryItemPatch::default()
        };
        svc.update_item(tenant, a.id, patch, None, Utc::now()).await.unwrap();
        let list = svc.items(tenant).await.unwrap();
        assert_eq!(list.as_slice()[0].stock, 40);
        assert_eq!(list.as_slice()[1].id, b.id);

        svc.delete_item(tenant, a.id).await.unwrap();
        let list = svc.items(tenant).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.get(&a.id).is_none());
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_the_store() {
        let svc = service();
        let tenant = TenantId::new();
        let mut bad = new_item("A");
        bad.stock = -1;
        let err = svc.create_item(tenant, bad, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidFields(_))));
        assert!(svc.stores().items.list(tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_write_leaves_the_snapshot_untouched() {
        let mut stores = CatalogStores::in_memory();
        stores.items = Arc::new(ReadOnlyItems(InMemoryTenantStore::new()));
        let svc = CatalogService::new(stores, Arc::new(InMemoryImageStore::new("https://img.local")));
        let tenant = TenantId::new();

        assert!(svc.items(tenant).await.unwrap().is_empty());
        let err = svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert!(svc.items(tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_upload_sets_the_url() {
        let svc = service();
        let tenant = TenantId::new();
        let saved = svc.create_item(tenant, new_item("A-1"), png(), Utc::now()).await.unwrap();
        assert_eq!(saved.image_error, None);
        let url = saved.record.image_url.unwrap();
        assert!(url.starts_with(&format!("https://img.local/{tenant}/inventory/A-1_")));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn failed_image_upload_still_saves_the_item() {
        let svc = CatalogService::new(CatalogStores::in_memory(), Arc::new(BrokenImages));
        let tenant = TenantId::new();
        let saved = svc.create_item(tenant, new_item("A"), png(), Utc::now()).await.unwrap();
        assert_eq!(saved.record.image_url, None);
        assert!(saved.image_error.unwrap().contains("bucket offline"));
        assert_eq!(svc.items(tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn package_requires_an_existing_base_item() {
        let svc = service();
        let tenant = TenantId::new();
        let payload = NewPackage {
            base_item_id: RecordId::new(),
            quantity_included: 2,
            package_price: 5.0,
            consume_stock: true,
            currency: "USD".into(),
            image_url: None,
        };
        let err = svc.create_package(tenant, payload.clone()).await.unwrap_err();
        match err {
            ServiceError::Domain(DomainError::InvalidFields(errors)) => {
                assert!(errors.get("base_item_id").is_some());
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }

        let item = svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap().record;
        let created = svc
            .create_package(tenant, NewPackage { base_item_id: item.id, ..payload })
            .await
            .unwrap();
        assert_eq!(svc.packages(tenant).await.unwrap(), vec![created]);

        // The base item can no longer be deleted.
        let err = svc.delete_item(tenant, item.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn deleting_a_combo_removes_its_components() {
        let svc = service();
        let tenant = TenantId::new();
        let a = svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap().record;
        let b = svc.create_item(tenant, new_item("B"), None, Utc::now()).await.unwrap().record;

        let combo = svc
            .create_combo(
                tenant,
                NewCombo {
                    combo_name: "Pair".into(),
                    combo_price: 9.0,
                    currency: "USD".into(),
                    is_active: true,
                    image_url: None,
                    components: vec![
                        NewComboComponent { component_item_id: a.id, component_qty: 1, consume_stock: true },
                        NewComboComponent { component_item_id: b.id, component_qty: 2, consume_stock: true },
                    ],
                },
            )
            .await
            .unwrap();
        assert_eq!(svc.combos(tenant).await.unwrap(), vec![combo.clone()]);

        let removed = svc.delete_combo(tenant, combo.header.id).await.unwrap();
        assert_eq!(removed.components.len(), 2);
        assert!(svc.combos(tenant).await.unwrap().is_empty());
        assert!(svc.stores().combo_components.list(tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn combo_update_can_replace_components() {
        let svc = service();
        let tenant = TenantId::new();
        let a = svc.create_item(tenant, new_item("A"), None, Utc::now()).await.unwrap().record;
        let combo = svc
            .create_combo(
                tenant,
                NewCombo {
                    combo_name: "Solo".into(),
                    combo_price: 1.0,
                    currency: "USD".into(),
                    is_active: true,
                    image_url: None,
                    components: vec![],
                },
            )
            .await
            .unwrap();
        assert!(!combo.is_complete());

        let patch = ComboHeaderPatch {
            combo_price: Some(2.0),
            components: Some(vec![NewComboComponent {
                component_item_id: a.id,
                component_qty: 3,
                consume_stock: false,
            }]),
            ..ComboHeaderPatch::default()
        };
        let updated = svc.update_combo(tenant, combo.header.id, patch).await.unwrap();
        assert!(updated.is_complete());
        assert_eq!(updated.header.combo_price, 2.0);
        assert_eq!(svc.combos(tenant).await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn combo_with_unknown_component_is_rejected() {
        let svc = service();
        let err = svc
            .create_combo(
                TenantId::new(),
                NewCombo {
                    combo_name: "Ghost".into(),
                    combo_price: 1.0,
                    currency: "USD".into(),
                    is_active: true,
                    image_url: None,
                    components: vec![NewComboComponent {
                        component_item_id: RecordId::new(),
                        component_qty: 1,
                        consume_stock: true,
                    }],
                },
            )
            .await
            .unwrap_err();
        match err {
            ServiceError::Domain(DomainError::InvalidFields(errors)) => {
                assert!(errors.get("components[0].component_item_id").is_some());
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let svc = service();
        let tenant = TenantId::new();
        let id = RecordId::new();
        assert!(matches!(
            svc.delete_item(tenant, id).await,
            Err(ServiceError::Domain(DomainError::NotFound))
        ));
        assert!(matches!(
            svc.delete_combo(tenant, id).await,
            Err(ServiceError::Domain(DomainError::NotFound))
        ));
        assert!(matches!(
            svc.update_package(tenant, id, PackagePatch::default()).await,
            Err(ServiceError::Domain(DomainError::NotFound))
        ));
    }
}

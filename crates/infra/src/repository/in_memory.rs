use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::RwLock;

use async_trait::async_trait;

use letmebuy_core::{Direction, Entity, Identifier, Page, PageRequest};

use super::{GatewayError, Repository};

type RowCheck<E> = Box<dyn Fn(&E) -> Result<(), GatewayError> + Send + Sync>;
type IdCheck<I> = Box<dyn Fn(I) -> Result<(), GatewayError> + Send + Sync>;
type UniqueKey<E> = (&'static str, fn(&E) -> String);

/// In-memory repository for tests/dev.
///
/// Constraints mirror the relational schema: unique keys are checked against
/// this table, reference checks run before a save and dependent checks run
/// before a delete. Cross-table checks complete before this table's write lock
/// is taken, so no two locks are ever held at once.
pub struct InMemoryRepository<E: Entity> {
    rows: RwLock<BTreeMap<E::Id, E>>,
    next_id: AtomicI64,
    unique: Vec<UniqueKey<E>>,
    references: RwLock<Vec<RowCheck<E>>>,
    dependents: RwLock<Vec<IdCheck<E::Id>>>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            unique: Vec::new(),
            references: RwLock::new(Vec::new()),
            dependents: RwLock::new(Vec::new()),
        }
    }

    /// Reject saves where `key` collides with another row's key.
    pub fn with_unique(mut self, name: &'static str, key: fn(&E) -> String) -> Self {
        self.unique.push((name, key));
        self
    }

    /// Run `check` before every save (e.g. "referenced category exists").
    pub fn add_reference_check(
        &self,
        check: impl Fn(&E) -> Result<(), GatewayError> + Send + Sync + 'static,
    ) {
        if let Ok(mut checks) = self.references.write() {
            checks.push(Box::new(check));
        }
    }

    /// Run `check` before every delete (e.g. "no product still points here").
    pub fn add_dependent_check(
        &self,
        check: impl Fn(E::Id) -> Result<(), GatewayError> + Send + Sync + 'static,
    ) {
        if let Ok(mut checks) = self.dependents.write() {
            checks.push(Box::new(check));
        }
    }

    pub fn contains(&self, id: E::Id) -> Result<bool, GatewayError> {
        Ok(self.read_rows()?.contains_key(&id))
    }

    pub fn any(&self, pred: impl Fn(&E) -> bool) -> Result<bool, GatewayError> {
        Ok(self.read_rows()?.values().any(pred))
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_rows(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<E::Id, E>>, GatewayError> {
        self.rows
            .read()
            .map_err(|_| GatewayError::backend(format!("{} table lock poisoned", E::KIND)))
    }

    fn write_rows(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<E::Id, E>>, GatewayError> {
        self.rows
            .write()
            .map_err(|_| GatewayError::backend(format!("{} table lock poisoned", E::KIND)))
    }

    fn run_reference_checks(&self, entity: &E) -> Result<(), GatewayError> {
        let checks = self
            .references
            .read()
            .map_err(|_| GatewayError::backend("constraint registry poisoned"))?;
        checks.iter().try_for_each(|check| check(entity))
    }

    fn run_dependent_checks(&self, id: E::Id) -> Result<(), GatewayError> {
        let checks = self
            .dependents
            .read()
            .map_err(|_| GatewayError::backend("constraint registry poisoned"))?;
        checks.iter().try_for_each(|check| check(id))
    }

    fn check_unique(&self, rows: &BTreeMap<E::Id, E>, entity: &E) -> Result<(), GatewayError> {
        for (name, key) in &self.unique {
            let wanted = key(entity);
            let clash = rows
                .values()
                .any(|other| other.id() != entity.id() && key(other) == wanted);
            if clash {
                return Err(GatewayError::integrity(format!(
                    "duplicate {} {name} '{wanted}'",
                    E::KIND
                )));
            }
        }
        Ok(())
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn compare<E: Entity>(a: &E, b: &E, page: &PageRequest) -> Ordering {
    let by_field = page
        .sort
        .as_ref()
        .and_then(|sort| {
            a.compare_by(b, &sort.field).map(|ord| match sort.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            })
        })
        .unwrap_or(Ordering::Equal);
    by_field.then_with(|| a.id().cmp(&b.id()))
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, GatewayError> {
        Ok(self.read_rows()?.get(&id).cloned())
    }

    async fn save(&self, mut entity: E) -> Result<E, GatewayError> {
        self.run_reference_checks(&entity)?;

        let mut rows = self.write_rows()?;
        self.check_unique(&rows, &entity)?;

        let id = match entity.id() {
            Some(id) => {
                if !rows.contains_key(&id) {
                    return Err(GatewayError::NotFound);
                }
                id
            }
            None => {
                let id = E::Id::from_raw(self.next_id.fetch_add(1, AtomicOrdering::SeqCst));
                entity.assign_id(id);
                id
            }
        };

        rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn delete_by_id(&self, id: E::Id) -> Result<(), GatewayError> {
        self.run_dependent_checks(id)?;

        let mut rows = self.write_rows()?;
        match rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(GatewayError::NotFound),
        }
    }

    async fn query(&self, page: &PageRequest, filter: &E::Filter) -> Result<Page<E>, GatewayError> {
        let rows = self.read_rows()?;
        let mut matching: Vec<&E> = rows.values().filter(|e| e.matches(filter)).collect();
        matching.sort_by(|a, b| compare(*a, *b, page));

        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.size as usize)
            .cloned()
            .collect();

        Ok(Page::new(content, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letmebuy_catalog::{Category, CategoryFilter};
    use letmebuy_core::{CategoryId, Sort};

    #[tokio::test]
    async fn save_assigns_sequential_ids() {
        let repo = InMemoryRepository::<Category>::new();
        let a = repo.save(Category::new("Books")).await.unwrap();
        let b = repo.save(Category::new("Computers")).await.unwrap();
        assert_eq!(a.id(), Some(CategoryId::new(1)));
        assert_eq!(b.id(), Some(CategoryId::new(2)));
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn saving_a_vanished_row_is_not_an_upsert() {
        let repo = InMemoryRepository::<Category>::new();
        let saved = repo.save(Category::new("Books")).await.unwrap();
        let id = saved.id().unwrap();
        repo.delete_by_id(id).await.unwrap();

        let err = repo.save(saved).await.unwrap_err();
        assert_eq!(err, GatewayError::NotFound);
        assert!(repo.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_row_is_not_found_every_time() {
        let repo = InMemoryRepository::<Category>::new();
        for _ in 0..3 {
            assert_eq!(repo.delete_by_id(CategoryId::new(42)).await, Err(GatewayError::NotFound));
        }
    }

    #[tokio::test]
    async fn unique_keys_reject_duplicates_but_allow_self_updates() {
        let repo = InMemoryRepository::<Category>::new().with_unique("name", |c| c.name.to_lowercase());
        let mut books = repo.save(Category::new("Books")).await.unwrap();

        let err = repo.save(Category::new("BOOKS")).await.unwrap_err();
        assert!(matches!(err, GatewayError::IntegrityViolation(_)));

        books.name = "Books".into();
        assert!(repo.save(books).await.is_ok());
    }

    #[tokio::test]
    async fn dependent_checks_block_deletes() {
        let repo = InMemoryRepository::<Category>::new();
        let saved = repo.save(Category::new("Books")).await.unwrap();
        repo.add_dependent_check(|_| Err(GatewayError::integrity("category has products")));

        let err = repo.delete_by_id(saved.id().unwrap()).await.unwrap_err();
        assert!(matches!(err, GatewayError::IntegrityViolation(_)));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn query_filters_sorts_and_pages() {
        let repo = InMemoryRepository::<Category>::new();
        for name in ["Books", "Electronics", "Computers", "Board games"] {
            repo.save(Category::new(name)).await.unwrap();
        }

        let filter = CategoryFilter { name: Some("o".into()) };
        let page = PageRequest::new(Some(0), Some(2)).with_sort(Sort::desc("name"));
        let result = repo.query(&page, &filter).await.unwrap();

        assert_eq!(result.total_elements, 4);
        assert_eq!(result.total_pages, 2);
        let names: Vec<_> = result.content.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Electronics", "Computers"]);

        let beyond = repo.query(&PageRequest::new(Some(5), Some(2)), &filter).await.unwrap();
        assert!(beyond.is_empty());
        assert_eq!(beyond.total_elements, 4);
    }
}

//! CRUD orchestration over a [`Repository`].
//!
//! Every operation resolves to exactly one [`Outcome`]; only fatal backend
//! failures come back as `Err` and are propagated unchanged.

use std::marker::PhantomData;

use tracing::debug;

use letmebuy_auth::{authorize, Actor};
use letmebuy_core::{Entity, EntityPatch, Identifier, NewEntity, Outcome, Page, PageRequest, ResourceRef};

use crate::repository::{GatewayError, Repository};

/// Translate gateway signals into outcomes; `Backend` stays an error.
fn translate<T>(result: Result<T, GatewayError>) -> Result<Outcome<T>, GatewayError> {
    match result {
        Ok(value) => Ok(Outcome::Success(value)),
        Err(GatewayError::NotFound) => Ok(Outcome::NotFound),
        Err(GatewayError::IntegrityViolation(reason)) => Ok(Outcome::Conflict(reason)),
        Err(fatal) => Err(fatal),
    }
}

pub struct CrudService<E, R> {
    repo: R,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R> CrudService<E, R>
where
    E: Entity,
    R: Repository<E>,
{
    pub fn new(repo: R) -> Self {
        Self { repo, _entity: PhantomData }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// `true` when `actor` may touch the record; kinds that are not actor-scoped always pass.
    fn permits(actor: Option<&Actor>, id: E::Id) -> bool {
        !E::KIND.is_actor_scoped() || authorize(actor, ResourceRef::new(id.raw())).is_allowed()
    }

    pub async fn find_by_id(
        &self,
        actor: Option<&Actor>,
        id: E::Id,
    ) -> Result<Outcome<E>, GatewayError> {
        if !Self::permits(actor, id) {
            debug!(kind = %E::KIND, %id, "find_by_id denied");
            return Ok(Outcome::Unauthorized);
        }

        let outcome = match self.repo.find_by_id(id).await {
            Ok(found) => Outcome::from(found),
            Err(GatewayError::NotFound) => Outcome::NotFound,
            Err(e) => return Err(e),
        };
        debug!(kind = %E::KIND, %id, outcome = outcome.label(), "find_by_id");
        Ok(outcome)
    }

    pub async fn find_all_paged(
        &self,
        page: &PageRequest,
        filter: &E::Filter,
    ) -> Result<Outcome<Page<E>>, GatewayError> {
        let result = self.repo.query(page, filter).await?;
        debug!(
            kind = %E::KIND,
            page = page.page,
            size = page.size,
            total = result.total_elements,
            "find_all_paged"
        );
        Ok(Outcome::Success(result))
    }

    pub async fn create<I>(&self, input: I) -> Result<Outcome<E>, GatewayError>
    where
        I: NewEntity<E>,
    {
        let outcome = translate(self.repo.save(input.into_entity()).await)?;
        match &outcome {
            Outcome::Success(created) => {
                debug!(kind = %E::KIND, id = ?created.id(), "created");
            }
            other => debug!(kind = %E::KIND, outcome = other.label(), "create rejected"),
        }
        Ok(outcome)
    }

    /// Fetch, patch, save. A missing record is `NotFound` without any save;
    /// a record that vanishes before the save is `NotFound` as well.
    pub async fn update<P>(
        &self,
        actor: Option<&Actor>,
        id: E::Id,
        patch: P,
    ) -> Result<Outcome<E>, GatewayError>
    where
        P: EntityPatch<E>,
    {
        if !Self::permits(actor, id) {
            debug!(kind = %E::KIND, %id, "update denied");
            return Ok(Outcome::Unauthorized);
        }

        let mut entity = match self.repo.find_by_id(id).await {
            Ok(Some(entity)) => entity,
            Ok(None) | Err(GatewayError::NotFound) => {
                debug!(kind = %E::KIND, %id, "update of missing record");
                return Ok(Outcome::NotFound);
            }
            Err(e) => return Err(e),
        };

        patch.apply_to(&mut entity);

        let outcome = translate(self.repo.save(entity).await)?;
        debug!(kind = %E::KIND, %id, outcome = outcome.label(), "update");
        Ok(outcome)
    }

    /// Exactly one gateway delete per call.
    pub async fn delete(&self, id: E::Id) -> Result<Outcome<()>, GatewayError> {
        let outcome = translate(self.repo.delete_by_id(id).await)?;
        debug!(kind = %E::KIND, %id, outcome = outcome.label(), "delete");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use proptest::prelude::*;

    use letmebuy_auth::{Role, RoleSet, User, UserUpdate};
    use letmebuy_catalog::{Category, CategoryFilter, CategoryInput};
    use letmebuy_core::{CategoryId, UserId};

    use crate::repository::InMemoryRepository;

    const EXISTING_ID: i64 = 1;
    const NON_EXISTING_ID: i64 = 2;
    const DEPENDENT_ID: i64 = 3;

    /// Records every gateway call before delegating to an in-memory table.
    struct CountingRepository<E: Entity> {
        inner: InMemoryRepository<E>,
        finds: AtomicUsize,
        saves: AtomicUsize,
        deletes: Mutex<Vec<E::Id>>,
    }

    impl<E: Entity> CountingRepository<E> {
        fn new(inner: InMemoryRepository<E>) -> Self {
            Self { inner, finds: AtomicUsize::new(0), saves: AtomicUsize::new(0), deletes: Mutex::new(Vec::new()) }
        }

        fn finds(&self) -> usize {
            self.finds.load(Ordering::SeqCst)
        }

        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        fn deletes(&self) -> Vec<E::Id> {
            self.deletes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<E: Entity> Repository<E> for CountingRepository<E> {
        async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, GatewayError> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }

        async fn save(&self, entity: E) -> Result<E, GatewayError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(entity).await
        }

        async fn delete_by_id(&self, id: E::Id) -> Result<(), GatewayError> {
            self.deletes.lock().unwrap().push(id);
            self.inner.delete_by_id(id).await
        }

        async fn query(&self, page: &PageRequest, filter: &E::Filter) -> Result<Page<E>, GatewayError> {
            self.inner.query(page, filter).await
        }
    }

    /// Every call fails as if the database were unreachable.
    struct BrokenRepository;

    #[async_trait]
    impl Repository<Category> for BrokenRepository {
        async fn find_by_id(&self, _id: CategoryId) -> Result<Option<Category>, GatewayError> {
            Err(GatewayError::backend("connection refused"))
        }

        async fn save(&self, _entity: Category) -> Result<Category, GatewayError> {
            Err(GatewayError::backend("connection refused"))
        }

        async fn delete_by_id(&self, _id: CategoryId) -> Result<(), GatewayError> {
            Err(GatewayError::backend("connection refused"))
        }

        async fn query(&self, _page: &PageRequest, _filter: &CategoryFilter) -> Result<Page<Category>, GatewayError> {
            Err(GatewayError::backend("connection refused"))
        }
    }

    fn actor(id: i64, roles: &[Role]) -> Actor {
        Actor::new(UserId::new(id), roles.iter().cloned().collect::<RoleSet>())
    }

    /// Categories 1 and 3 exist, 2 was deleted, and 3 is still referenced.
    async fn category_service() -> CrudService<Category, CountingRepository<Category>> {
        let inner = InMemoryRepository::<Category>::new();
        for name in ["Books", "Electronics", "Computers"] {
            inner.save(Category::new(name)).await.unwrap();
        }
        inner.delete_by_id(CategoryId::new(NON_EXISTING_ID)).await.unwrap();
        inner.add_dependent_check(|id| {
            if id == CategoryId::new(DEPENDENT_ID) {
                Err(GatewayError::integrity("category has products"))
            } else {
                Ok(())
            }
        });
        CrudService::new(CountingRepository::new(inner))
    }

    /// Users 1 (plain) and 2 (plain) exist.
    async fn user_service() -> CrudService<User, CountingRepository<User>> {
        let inner = InMemoryRepository::<User>::new();
        for email in ["maria@gmail.com", "alex@gmail.com"] {
            inner
                .save(User::new("First", "Last", email, "$argon2id$x", RoleSet::new()))
                .await
                .unwrap();
        }
        CrudService::new(CountingRepository::new(inner))
    }

    fn profile(first_name: &str) -> UserUpdate {
        UserUpdate {
            first_name: first_name.into(),
            last_name: "Last".into(),
            email: "maria@gmail.com".into(),
            roles: None,
        }
    }

    #[tokio::test]
    async fn non_admin_reads_own_user_record() {
        let service = user_service().await;
        let maria = actor(1, &[]);

        let outcome = service.find_by_id(Some(&maria), UserId::new(1)).await.unwrap();
        let user = outcome.success().expect("own record");
        assert_eq!(user.email, "maria@gmail.com");
    }

    #[tokio::test]
    async fn non_admin_cannot_read_someone_else_and_gateway_is_not_consulted() {
        let service = user_service().await;
        let maria = actor(1, &[Role::OPERATOR]);

        let outcome = service.find_by_id(Some(&maria), UserId::new(2)).await.unwrap();
        assert_eq!(outcome, Outcome::Unauthorized);

        let anonymous = service.find_by_id(None, UserId::new(1)).await.unwrap();
        assert_eq!(anonymous, Outcome::Unauthorized);
        assert_eq!(service.repository().finds(), 0);
    }

    #[tokio::test]
    async fn admin_reads_anyone_and_missing_is_not_found() {
        let service = user_service().await;
        let admin = actor(99, &[Role::ADMIN]);

        assert!(service.find_by_id(Some(&admin), UserId::new(2)).await.unwrap().success().is_some());
        assert_eq!(service.find_by_id(Some(&admin), UserId::new(7)).await.unwrap(), Outcome::NotFound);
    }

    #[tokio::test]
    async fn records_that_are_not_actor_scoped_skip_authorization() {
        let service = category_service().await;
        let outcome = service.find_by_id(None, CategoryId::new(EXISTING_ID)).await.unwrap();
        assert_eq!(outcome.success().map(|c| c.name), Some("Books".to_string()));
    }

    #[tokio::test]
    async fn delete_existing_succeeds_with_one_gateway_call() {
        let service = category_service().await;
        let outcome = service.delete(CategoryId::new(EXISTING_ID)).await.unwrap();
        assert_eq!(outcome, Outcome::Success(()));
        assert_eq!(service.repository().deletes(), vec![CategoryId::new(EXISTING_ID)]);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found_with_one_gateway_call() {
        let service = category_service().await;
        let outcome = service.delete(CategoryId::new(NON_EXISTING_ID)).await.unwrap();
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(service.repository().deletes(), vec![CategoryId::new(NON_EXISTING_ID)]);
    }

    #[tokio::test]
    async fn delete_dependent_is_conflict_with_one_gateway_call() {
        let service = category_service().await;
        let outcome = service.delete(CategoryId::new(DEPENDENT_ID)).await.unwrap();
        assert!(matches!(outcome, Outcome::Conflict(_)));
        assert_eq!(service.repository().deletes(), vec![CategoryId::new(DEPENDENT_ID)]);
        assert!(service.find_by_id(None, CategoryId::new(DEPENDENT_ID)).await.unwrap().success().is_some());
    }

    #[tokio::test]
    async fn update_missing_is_not_found_without_save() {
        let service = category_service().await;
        let outcome = service
            .update(None, CategoryId::new(NON_EXISTING_ID), CategoryInput { name: "Games".into() })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(service.repository().saves(), 0);
    }

    #[tokio::test]
    async fn update_existing_saves_once_and_keeps_identity() {
        let service = category_service().await;
        let outcome = service
            .update(None, CategoryId::new(EXISTING_ID), CategoryInput { name: "Games".into() })
            .await
            .unwrap();
        let updated = outcome.success().expect("updated");
        assert_eq!(updated.id(), Some(CategoryId::new(EXISTING_ID)));
        assert_eq!(updated.name, "Games");
        assert_eq!(service.repository().saves(), 1);
    }

    #[tokio::test]
    async fn update_of_another_user_is_denied_before_any_gateway_call() {
        let service = user_service().await;
        let alex = actor(2, &[]);
        let outcome = service.update(Some(&alex), UserId::new(1), profile("Hacked")).await.unwrap();
        assert_eq!(outcome, Outcome::Unauthorized);
        assert_eq!((service.repository().finds(), service.repository().saves()), (0, 0));
    }

    #[tokio::test]
    async fn user_updates_own_profile() {
        let service = user_service().await;
        let maria = actor(1, &[]);
        let outcome = service.update(Some(&maria), UserId::new(1), profile("Mary")).await.unwrap();
        assert_eq!(outcome.success().map(|u| u.first_name), Some("Mary".to_string()));
    }

    #[tokio::test]
    async fn create_with_integrity_violation_is_conflict() {
        let service = user_service().await;
        let duplicate = letmebuy_auth::NewUser {
            first_name: "Other".into(),
            last_name: "Maria".into(),
            email: "maria@gmail.com".into(),
            password_hash: "$argon2id$y".into(),
            roles: RoleSet::new(),
        };
        // Unique keys are registered on the table, not the counting wrapper.
        let unique = CrudService::<User, _>::new(
            InMemoryRepository::<User>::new().with_unique("email", |u| u.email.clone()),
        );
        assert!(unique.create(duplicate.clone()).await.unwrap().success().is_some());
        assert!(matches!(unique.create(duplicate).await.unwrap(), Outcome::Conflict(_)));

        let created = service
            .create(letmebuy_auth::NewUser {
                first_name: "Ana".into(),
                last_name: "Lima".into(),
                email: "ana@gmail.com".into(),
                password_hash: "$argon2id$z".into(),
                roles: RoleSet::new(),
            })
            .await
            .unwrap();
        assert_eq!(created.success().and_then(|u| u.id()), Some(UserId::new(3)));
    }

    #[tokio::test]
    async fn empty_page_is_success() {
        let service = CrudService::<Category, _>::new(InMemoryRepository::<Category>::new());
        let page = service
            .find_all_paged(&PageRequest::default(), &CategoryFilter::default())
            .await
            .unwrap()
            .success()
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn backend_failures_propagate_unchanged() {
        let service = CrudService::<Category, _>::new(BrokenRepository);
        let expected = GatewayError::backend("connection refused");

        assert_eq!(service.delete(CategoryId::new(1)).await.unwrap_err(), expected);
        assert_eq!(service.find_by_id(None, CategoryId::new(1)).await.unwrap_err(), expected);
        assert_eq!(
            service
                .update(None, CategoryId::new(1), CategoryInput { name: "x".into() })
                .await
                .unwrap_err(),
            expected
        );
        assert_eq!(
            service.create(CategoryInput { name: "x".into() }).await.unwrap_err(),
            expected
        );
    }

    proptest! {
        #[test]
        fn repeated_delete_of_missing_is_always_not_found(id in 4i64..10_000, repeats in 1usize..5) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let service = category_service().await;
                for _ in 0..repeats {
                    let outcome = service.delete(CategoryId::new(id)).await.unwrap();
                    assert_eq!(outcome, Outcome::NotFound);
                }
                assert_eq!(service.repository().deletes().len(), repeats);
            });
        }
    }
}

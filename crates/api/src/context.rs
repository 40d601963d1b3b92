use letmebuy_auth::Actor;

/// Caller of the current request.
///
/// Always present as a request extension; `None` inside means no bearer token
/// was sent. Handlers pass it explicitly to every core operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentActor(Option<Actor>);

impl CurrentActor {
    pub fn new(actor: Option<Actor>) -> Self {
        Self(actor)
    }

    pub fn get(&self) -> Option<&Actor> {
        self.0.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(Actor::is_admin)
    }
}

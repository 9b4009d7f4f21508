//! Mounting the gate in front of application routes.

use std::sync::Arc;

use axum::{middleware, Router};

use crate::auth::AuthResolver;
use crate::config::GateOrder;
use crate::http::middleware::{auth_middleware, rate_limit_middleware, RateLimitState};

/// Auth resolver plus optional rate limiter, applied in a fixed order.
///
/// The two layers never read each other's output.
#[derive(Clone)]
pub struct Gate {
    resolver: Arc<AuthResolver>,
    rate_limit: Option<RateLimitState>,
    order: GateOrder,
}

impl Gate {
    pub fn new(resolver: Arc<AuthResolver>, rate_limit: Option<RateLimitState>, order: GateOrder) -> Self {
        Self {
            resolver,
            rate_limit,
            order,
        }
    }

    pub fn resolver(&self) -> &Arc<AuthResolver> {
        &self.resolver
    }

    pub fn order(&self) -> GateOrder {
        self.order
    }

    /// Wrap every route of `router`. The layer added last runs first.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let auth = middleware::from_fn_with_state(self.resolver.clone(), auth_middleware);

        let Some(rate_limit) = self.rate_limit.clone() else {
            return router.layer(auth);
        };
        let limit = middleware::from_fn_with_state(rate_limit, rate_limit_middleware);

        match self.order {
            GateOrder::RateLimitFirst => router.layer(auth).layer(limit),
            GateOrder::AuthFirst => router.layer(limit).layer(auth),
        }
    }
}

use std::sync::Arc;

use crate::{
    ai::ListingGenerator,
    config::AppConfig,
    db::{DbPool, OrmConn},
    payments::PaymentGateway,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub generator: Arc<dyn ListingGenerator>,
    pub payments: Arc<dyn PaymentGateway>,
}

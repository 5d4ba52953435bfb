use std::sync::Arc;

use crate::application::cities::CityService;
use crate::application::trends::TrendService;

#[derive(Clone)]
pub struct ApiState {
    pub cities: Arc<CityService>,
    pub trends: Arc<TrendService>,
}

//! Parameter sources read at call time.

use amm_domain::params::Params;

/// Yields the current engine parameters.
pub trait ParamSource {
    fn params(&self) -> Params;
}

/// A parameter source that can be updated.
pub trait ParamStore: ParamSource {
    fn set_params(&mut self, params: Params);
}

impl ParamSource for Params {
    fn params(&self) -> Params {
        self.clone()
    }
}

impl ParamStore for Params {
    fn set_params(&mut self, params: Params) {
        *self = params;
    }
}

/// Errors raised while registering routes or generating URLs
#[derive(thiserror::Error, Debug, Clone)]
pub enum RoutingError {
    #[error("invalid requirement for parameter '{parameter}' in route '{pattern}': {source}")]
    InvalidRequirement {
        pattern: String,
        parameter: String,
        #[source]
        source: regex::Error,
    },

    #[error("route name '{0}' is already registered")]
    DuplicateRouteName(String),

    #[error("route '{0}' not found")]
    RouteNotFound(String),

    #[error("missing required parameter '{parameter}' for route '{route}'")]
    MissingRequiredParameter { route: String, parameter: String },

    #[error("parameter '{parameter}' with value '{value}' does not satisfy requirement for route '{route}'")]
    RequirementNotSatisfied { route: String, parameter: String, value: String },

    #[error("wildcard parameter '{parameter}' for route '{route}' cannot contain '/'")]
    InvalidWildcardValue { route: String, parameter: String },

    #[error("route '{0}' contains an unnamed wildcard segment and cannot be generated")]
    UnnamedWildcard(String),
}

pub type RoutingResult<T> = std::result::Result<T, RoutingError>;

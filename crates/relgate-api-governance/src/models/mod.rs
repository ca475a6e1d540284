//! Request and response models for the governance API.

mod cab;
mod exception;
mod maturity;

pub use cab::{
    ApproveRequestRequest, CabRequestListResponse, CabRequestResponse, DecisionResponse,
    IntentStatusResponse, ListQuery, RejectRequestRequest, SubmitCabRequestRequest,
    SubmitCabResponse,
};
pub use exception::{
    CreateExceptionRequest, ExceptionActionRequest, ExceptionListResponse, ExceptionResponse,
};
pub use maturity::{
    EvaluateMaturityRequest, MaturityEvaluationResponse, MaturityProgressResponse,
    MaturityStatusResponse,
};

//! Standard steps every operation registers
//!
//! Each submodule holds one or more steps and the registrar functions that
//! place them. `STANDARD_REGISTRARS` is the shared wiring applied, in order,
//! after an operation's own serializer and deserializer are registered.

pub mod endpoint;
pub mod headers;
pub mod input;
pub mod logging;
pub mod metadata;
pub mod payload;
pub mod response;
pub mod retry;

use crate::core::{AssemblyError, ClientConfig, Registrar, Stack};
use std::sync::Arc;

pub use endpoint::{add_resolve_endpoint, ResolveEndpoint};
pub use headers::{
    add_client_request_id, add_compute_content_length, add_user_agent, ClientRequestId,
    ComputeContentLength, UserAgent,
};
pub use input::{
    add_set_operation_input, deserializer_registrar, serializer_registrar, DeserializeFn,
    OperationDeserializer, OperationSerializer, SerializeFn, SerializeInput, SetOperationInput,
};
pub use logging::{add_request_logging, RequestResponseLogging};
pub use metadata::{add_service_metadata, RegisterServiceMetadata};
pub use payload::{
    add_compute_payload_sha256, add_recursion_detection, ComputePayloadSHA256,
    RecursionDetection,
};
pub use response::{
    add_raw_response_to_metadata, add_record_response_timing, add_request_id_retriever,
    add_response_error_handler, RawResponseToMetadata, RecordResponseTiming, RequestIdRetriever,
    ResponseErrorHandler,
};
pub use retry::{add_retry, Retry};

pub type RegistrarFn = fn(&mut Stack, &ClientConfig) -> Result<(), AssemblyError>;

/// Cross-cutting registrars shared by every operation, in registration order
pub const STANDARD_REGISTRARS: &[RegistrarFn] = &[
    add_resolve_endpoint,
    add_client_request_id,
    add_compute_content_length,
    add_compute_payload_sha256,
    add_user_agent,
    add_recursion_detection,
    add_retry,
    add_request_logging,
    add_response_error_handler,
    add_request_id_retriever,
    add_raw_response_to_metadata,
    add_record_response_timing,
    add_service_metadata,
];

/// `STANDARD_REGISTRARS` as shareable registrars
pub fn standard_registrars() -> Vec<Arc<dyn Registrar>> {
    STANDARD_REGISTRARS
        .iter()
        .map(|f| Arc::new(*f) as Arc<dyn Registrar>)
        .collect()
}

//! Custom extractors

use aide::openapi::{MediaType, Operation, ReferenceOr, RequestBody};
use aide::operation::OperationInput;
use aide::OperationOutput;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};

use crate::types::error::AppError;

/// Raw proof token posted by the wallet.
///
/// The body is taken as is, whatever the content type; wallets send the
/// JWZ token as plain text.
pub struct ProofToken(pub Bytes);

impl<S> FromRequest<S> for ProofToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|err| {
            tracing::warn!("Failed to read callback body: {err}");
            AppError::new(
                StatusCode::BAD_REQUEST,
                "invalid_body",
                "Request body could not be read",
                false,
            )
        })?;

        Ok(Self(body))
    }
}

impl OperationInput for ProofToken {
    fn operation_input(_ctx: &mut aide::generate::GenContext, operation: &mut Operation) {
        let mut body = RequestBody {
            description: Some("Proof token produced by the wallet".to_string()),
            required: true,
            ..Default::default()
        };
        body.content
            .insert("text/plain".to_string(), MediaType::default());
        operation.request_body = Some(ReferenceOr::Item(body));
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AppError::inferred_responses(ctx, operation)
    }
}

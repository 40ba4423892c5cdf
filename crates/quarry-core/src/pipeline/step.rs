use std::future::Future;

use super::PipelineError;

/// One typed stage of a [`super::Pipeline`].
pub trait Step: Send + Sync {
    type Input: Send;
    type Output: Send;

    /// Label used in pipeline logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn run(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output, PipelineError>> + Send;
}

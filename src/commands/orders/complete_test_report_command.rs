use crate::{
    commands::{
        orders::{complete_stage, non_blank, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{Order, Stage, TestReportRecord},
    store::OrderStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestReportForm {
    #[validate(length(min = 1, message = "uniqueKey is required"))]
    pub unique_key: Option<String>,
    #[validate(length(min = 1, message = "stepKey is required"))]
    pub step_key: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CompleteTestReportCommand {
    pub target: StageTarget,
    pub form: TestReportForm,
}

#[async_trait::async_trait]
impl Command for CompleteTestReportCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let unique_key = non_blank(&self.form.unique_key)
            .ok_or_else(|| ServiceError::ValidationError("uniqueKey is required".into()))?;
        let step_key = non_blank(&self.form.step_key)
            .ok_or_else(|| ServiceError::ValidationError("stepKey is required".into()))?;

        complete_stage(
            &store,
            &event_sender,
            Stage::TestReport,
            &self.target,
            |order, ctx| {
                order.test_report = Some(TestReportRecord {
                    completed_on: ctx.today,
                    unique_key,
                    step_key,
                });
                Ok(())
            },
        )
        .await
    }
}

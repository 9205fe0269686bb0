use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

use crate::dao::invitation::InvitationDao;

/// Starts the cron job that persists `expired` on overdue invitations.
/// The returned scheduler must be kept alive for the job to keep running.
pub async fn start_invitation_sweep(
    invitations: Arc<InvitationDao>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_id, _lock| {
        let invitations = Arc::clone(&invitations);
        Box::pin(async move {
            match invitations.expire_overdue().await {
                Ok(count) => info!(count, "Invitation sweep finished"),
                Err(e) => error!(error = %e, "Invitation sweep failed"),
            }
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(%cron, "Invitation sweep scheduled");
    Ok(scheduler)
}

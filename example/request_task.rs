//! Runs one grasp cycle against an OpenAI-compatible server.
//!
//! ```text
//! GRASP_PLANNER_BASE_URL=http://localhost:8000/v1 \
//!     cargo run --example request_task -- frame.png "grab the green cup"
//! ```

use grasp_planner::{GraspPlanner, ImageRef, PlannerConfig, PromptType};
use tracing::{Level, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let mut args = std::env::args().skip(1);
    let frame = args.next().ok_or("usage: request_task <frame> [instruction]")?;
    let prompt = args.next().unwrap_or_else(|| "clear the table".to_string());
    let image = if frame.starts_with("http://") || frame.starts_with("https://") {
        ImageRef::url(frame)
    } else {
        ImageRef::path(frame)
    };

    let planner = GraspPlanner::connect(PlannerConfig::from_env()?).await?;

    let targets = match planner.classify_user_prompt(&prompt).await? {
        PromptType::TypeI => {
            planner
                .decompose_user_prompt(&prompt, Some(image.clone()))
                .await?
        }
        PromptType::TypeII => vec![planner.generate_instruction(Some(image.clone())).await?],
    };
    info!(?targets, "grasp sequence");

    for target in &targets {
        match planner.mark_bounding_box(target, Some(image.clone())).await {
            Ok(bbox) => info!(
                target = %target,
                bbox = ?bbox.bbox_2d,
                label = %bbox.label,
                "target located"
            ),
            Err(e) if e.is_retryable() => warn!(target = %target, error = %e, "could not locate target"),
            Err(e) => return Err(e.into()),
        }
    }

    let done = planner.check_user_prompt_complete(Some(image)).await?;
    info!(done, "table cleared");
    Ok(())
}

use garde::Validate;
use serde::{Deserialize, Serialize};

/// End-user request to generate an image, relayed to the automation webhook.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Submission {
    #[serde(default)]
    #[garde(length(max = 200))]
    pub image_title: String,

    #[garde(range(min = 1))]
    pub job_count: u32,

    #[garde(length(min = 1, max = 200), custom(not_blank))]
    pub template_code: String,

    #[garde(dive)]
    pub jobs: Vec<JobEntry>,

    #[garde(dive)]
    pub contact: Contact,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobEntry {
    #[garde(length(min = 1, max = 200), custom(not_blank))]
    pub company: String,

    #[garde(length(min = 1, max = 200), custom(not_blank))]
    pub position: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub job_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Contact {
    #[garde(length(min = 1, max = 200), custom(not_blank))]
    pub email: String,

    #[garde(length(min = 1, max = 50), custom(not_blank))]
    pub zalo: String,
}

fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}

impl Submission {
    /// Field rules plus the slot invariant: one job per unit of job count.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|report| report.to_string())?;
        if self.jobs.len() != self.job_count as usize {
            return Err(format!(
                "expected {} jobs for job_count, got {}",
                self.job_count,
                self.jobs.len()
            ));
        }
        Ok(())
    }
}

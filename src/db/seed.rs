use tracing::info;

use crate::db::models::NewJob;
use crate::db::repository::JobRepository;

const DEFAULT_JOBS: [(&str, &str); 6] = [
    (
        "Full Stack Developer",
        "We are looking for an experienced Full Stack Developer to join our team. You will be responsible for developing both frontend and backend applications using modern technologies like Laravel, Vue.js, and React.",
    ),
    (
        "Frontend Developer",
        "Join our frontend team to build beautiful and responsive user interfaces. Experience with Vue.js, React, or Angular is required. You will work closely with designers to implement pixel-perfect designs.",
    ),
    (
        "Backend Developer",
        "We need a skilled Backend Developer proficient in Laravel and PHP. You will design and implement RESTful APIs, work with databases, and ensure the security and performance of our applications.",
    ),
    (
        "DevOps Engineer",
        "Looking for a DevOps Engineer to manage our cloud infrastructure. Experience with AWS, Docker, Kubernetes, and CI/CD pipelines is essential. You will ensure our applications run smoothly in production.",
    ),
    (
        "UI/UX Designer",
        "We are seeking a creative UI/UX Designer to craft intuitive user experiences. You should be proficient in Figma or Adobe XD and have a strong portfolio showcasing your design skills.",
    ),
    (
        "Mobile Developer",
        "Join our mobile development team to create cross-platform applications using React Native or Flutter. You will work on both iOS and Android platforms to deliver high-quality mobile experiences.",
    ),
];

pub fn default_jobs() -> Vec<NewJob> {
    DEFAULT_JOBS
        .iter()
        .map(|(title, description)| NewJob {
            title: title.to_string(),
            description: description.to_string(),
        })
        .collect()
}

/// Insert the default job postings.
///
/// Skips seeding when the table already holds jobs unless `force` is set.
/// Returns the number of jobs inserted.
pub async fn seed_jobs(jobs: &dyn JobRepository, force: bool) -> Result<usize, sqlx::Error> {
    let existing = jobs.count().await?;
    if existing > 0 && !force {
        info!("Jobs table already has {} rows, skipping seed", existing);
        return Ok(0);
    }

    let mut inserted = 0;
    for job in default_jobs() {
        let row = jobs.create(&job).await?;
        info!("Seeded job id={} title={}", row.id, row.title);
        inserted += 1;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    #[actix_web::test]
    async fn seeds_once_unless_forced() {
        let store = MemoryStore::new();

        assert_eq!(seed_jobs(&store, false).await.unwrap(), 6);
        assert_eq!(seed_jobs(&store, false).await.unwrap(), 0);
        assert_eq!(seed_jobs(&store, true).await.unwrap(), 6);
        assert_eq!(store.count().await.unwrap(), 12);
    }
}

use chrono::NaiveDate;

use crate::database::{load_snapshot, save_snapshot, SnapshotStore, POSTS_KEY};
use crate::models::Post;

/// Input for creating or updating a post. With an id it updates the
/// matching post in place; without one a new post is prepended.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub id: Option<String>,
    pub title: String,
    pub date: NaiveDate,
    pub content: String,
}

/// The blog post collection. Independent of tasks and events, same
/// snapshot flush discipline.
pub struct PostStore {
    posts: Vec<Post>,
}

impl PostStore {
    /// Hydrate from the snapshot store, seeding the starter posts when no
    /// snapshot exists yet.
    pub fn load(store: &dyn SnapshotStore) -> Self {
        match load_snapshot(store, POSTS_KEY) {
            Some(posts) => Self { posts },
            None => {
                let posts = seed_posts();
                save_snapshot(store, POSTS_KEY, &posts);
                Self { posts }
            }
        }
    }

    /// All posts, newest publish date first.
    pub fn posts(&self) -> Vec<&Post> {
        let mut sorted: Vec<&Post> = self.posts.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn flush(&self, store: &dyn SnapshotStore) {
        save_snapshot(store, POSTS_KEY, &self.posts);
    }

    /// Create or update a post and flush. Returns the id of the affected
    /// post; an unknown id on input is reported as `None` and nothing is
    /// written.
    pub fn save(&mut self, input: PostInput, store: &dyn SnapshotStore) -> Option<String> {
        match input.id {
            Some(id) => {
                let post = self.posts.iter_mut().find(|p| p.id == id)?;
                post.title = input.title;
                post.date = input.date;
                post.content = input.content;
                self.flush(store);
                Some(id)
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                // Newest entries go to the front.
                self.posts.insert(
                    0,
                    Post {
                        id: id.clone(),
                        title: input.title,
                        date: input.date,
                        content: input.content,
                    },
                );
                self.flush(store);
                Some(id)
            }
        }
    }

    pub fn delete(&mut self, id: &str, store: &dyn SnapshotStore) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != id);
        if self.posts.len() == before {
            return false;
        }
        self.flush(store);
        true
    }
}

/// Starter posts for a fresh installation.
fn seed_posts() -> Vec<Post> {
    fn seed(id: &str, title: &str, date: &str, content: &str) -> Option<Post> {
        Some(Post {
            id: id.to_string(),
            title: title.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?,
            content: content.to_string(),
        })
    }
    [
        seed(
            "welcome-to-the-new-planner",
            "Welcome to the New Planner",
            "2024-07-15",
            "This is the first post on the integrated blog! Updates, productivity tips, \
             and development notes live right here in the planner.",
        ),
        seed(
            "productivity-and-planning",
            "Productivity and Planning",
            "2024-07-18",
            "A key to staying productive is having a clear view of your tasks and your time.\n\n\
             - **Timeline:** see your multi-day events at a glance.\n\
             - **History:** review what you've accomplished.\n\n\
             Stay tuned for more features!",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn seeds_starter_posts_once() {
        let mem = MemoryStore::new();
        let posts = PostStore::load(&mem);
        assert_eq!(posts.posts().len(), 2);

        // Seeding persisted; the second load does not duplicate.
        let again = PostStore::load(&mem);
        assert_eq!(again.posts().len(), 2);
    }

    #[test]
    fn posts_are_newest_first() {
        let mem = MemoryStore::new();
        let posts = PostStore::load(&mem);
        let dates: Vec<NaiveDate> = posts.posts().iter().map(|p| p.date).collect();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn save_prepends_new_and_updates_existing() {
        let mem = MemoryStore::new();
        mem.save_raw(POSTS_KEY, "[]").unwrap();
        let mut posts = PostStore::load(&mem);

        let id = posts
            .save(
                PostInput {
                    id: None,
                    title: "First".into(),
                    date: day(2024, 8, 1),
                    content: "hello".into(),
                },
                &mem,
            )
            .unwrap();

        posts.save(
            PostInput {
                id: None,
                title: "Second".into(),
                date: day(2024, 8, 2),
                content: String::new(),
            },
            &mem,
        );
        // New posts land at the front of the raw collection.
        assert_eq!(posts.posts.len(), 2);
        assert_eq!(posts.posts[0].title, "Second");

        let updated = posts.save(
            PostInput {
                id: Some(id.clone()),
                title: "First, revised".into(),
                date: day(2024, 8, 1),
                content: "hello again".into(),
            },
            &mem,
        );
        assert_eq!(updated, Some(id.clone()));
        assert_eq!(posts.get(&id).unwrap().content, "hello again");

        let missing = posts.save(
            PostInput {
                id: Some("nope".into()),
                title: "ghost".into(),
                date: day(2024, 8, 3),
                content: String::new(),
            },
            &mem,
        );
        assert!(missing.is_none());
        assert_eq!(posts.posts.len(), 2);
    }

    #[test]
    fn delete_is_immediate() {
        let mem = MemoryStore::new();
        let mut posts = PostStore::load(&mem);
        let id = posts.posts()[0].id.clone();
        assert!(posts.delete(&id, &mem));
        assert!(posts.get(&id).is_none());
        assert!(!posts.delete(&id, &mem));

        let reloaded = PostStore::load(&mem);
        assert_eq!(reloaded.posts().len(), 1);
    }
}

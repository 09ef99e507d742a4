//! The people side of the service: user CRUD and the friendship graph.
//!
//! Friendships are directed edges. Adding a friend creates an unconfirmed
//! edge from the initiator; if the other user had already asked, both edges
//! become confirmed. Removing a friend deletes the initiator's edge and
//! demotes the reverse edge back to unconfirmed.

use std::collections::HashSet;

use crate::db::Db;
use crate::environment::SafeDb;
use crate::errors::BackendError;
use crate::user::{User, UserDraft, UserId};

pub async fn list_users(db: &SafeDb) -> Result<Vec<User>, BackendError> {
    let mut users = db.retrieve_users().await?;

    for user in users.iter_mut() {
        attach_relations(db, user).await?;
    }

    Ok(users)
}

pub async fn get_user(db: &SafeDb, id: UserId) -> Result<User, BackendError> {
    let mut user = db
        .retrieve_user(id)
        .await?
        .ok_or(BackendError::UserNotFound(id))?;

    attach_relations(db, &mut user).await?;

    Ok(user)
}

pub async fn create_user(db: &SafeDb, draft: UserDraft) -> Result<User, BackendError> {
    draft.validate()?;

    let id = db.insert_user(&draft).await?;

    get_user(db, id).await
}

pub async fn update_user(db: &SafeDb, draft: UserDraft) -> Result<User, BackendError> {
    let id = draft.id.ok_or(BackendError::MissingId)?;

    draft.validate()?;

    if !db.update_user(id, &draft).await? {
        return Err(BackendError::UserNotFound(id));
    }

    get_user(db, id).await
}

pub async fn delete_user(db: &SafeDb, id: UserId) -> Result<(), BackendError> {
    if !db.delete_user(id).await? {
        return Err(BackendError::UserNotFound(id));
    }

    Ok(())
}

/// Records a friend request from `user_id` to `friend_id`.
///
/// A reverse edge means the other user asked first, so both edges become
/// confirmed. Repeating a pending request is a no-op.
pub async fn add_friend(db: &SafeDb, user_id: UserId, friend_id: UserId) -> Result<(), BackendError> {
    if user_id == friend_id {
        return Err(BackendError::SelfFriendship { user_id });
    }

    ensure_user_exists(db, user_id).await?;
    ensure_user_exists(db, friend_id).await?;

    if db.retrieve_friendship(friend_id, user_id).await?.is_some() {
        db.confirm_friendship(user_id, friend_id).await?;
    } else if db.retrieve_friendship(user_id, friend_id).await?.is_none() {
        db.insert_friendship(user_id, friend_id).await?;
    }

    Ok(())
}

/// Removes `user_id`'s edge to `friend_id`, demoting the reverse edge if
/// there is one. Removing an absent edge is a no-op.
pub async fn remove_friend(
    db: &SafeDb,
    user_id: UserId,
    friend_id: UserId,
) -> Result<(), BackendError> {
    if user_id == friend_id {
        return Err(BackendError::SelfFriendship { user_id });
    }

    ensure_user_exists(db, user_id).await?;
    ensure_user_exists(db, friend_id).await?;

    db.delete_friendship(user_id, friend_id).await?;
    db.demote_friendship(friend_id, user_id).await?;

    Ok(())
}

/// Returns everyone `user_id` has an outbound edge to, confirmed or not.
pub async fn friends_of(db: &SafeDb, user_id: UserId) -> Result<Vec<User>, BackendError> {
    ensure_user_exists(db, user_id).await?;

    let mut ids = db.friend_ids(user_id).await?;
    ids.sort_unstable();

    resolve_users(db, &ids).await
}

/// Returns the users both `user_id` and `other_id` point at, in ascending
/// id order.
pub async fn common_friends(
    db: &SafeDb,
    user_id: UserId,
    other_id: UserId,
) -> Result<Vec<User>, BackendError> {
    ensure_user_exists(db, user_id).await?;
    ensure_user_exists(db, other_id).await?;

    let ours: HashSet<UserId> = db.friend_ids(user_id).await?.into_iter().collect();
    let theirs: HashSet<UserId> = db.friend_ids(other_id).await?.into_iter().collect();

    let mut shared: Vec<UserId> = ours.intersection(&theirs).copied().collect();
    shared.sort_unstable();

    resolve_users(db, &shared).await
}

async fn resolve_users(db: &SafeDb, ids: &[UserId]) -> Result<Vec<User>, BackendError> {
    let mut users = Vec::with_capacity(ids.len());

    for id in ids {
        users.push(get_user(db, *id).await?);
    }

    Ok(users)
}

async fn attach_relations(db: &SafeDb, user: &mut User) -> Result<(), BackendError> {
    user.friends = db.friend_ids(user.id).await?;
    user.friends.sort_unstable();

    user.likes = db.user_likes(user.id).await?;
    user.likes.sort_unstable();

    Ok(())
}

async fn ensure_user_exists(db: &SafeDb, id: UserId) -> Result<(), BackendError> {
    db.retrieve_user(id)
        .await?
        .ok_or(BackendError::UserNotFound(id))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::db::mock::MockDb;

    fn mock_db() -> SafeDb {
        Arc::new(MockDb::new())
    }

    fn draft(login: &str) -> UserDraft {
        UserDraft {
            id: None,
            email: format!("{}@example.com", login),
            login: login.to_owned(),
            name: None,
            birthday: NaiveDate::from_ymd_opt(1992, 7, 19).unwrap(),
        }
    }

    async fn seed_users(db: &SafeDb, count: usize) -> Vec<UserId> {
        let mut ids = vec![];

        for index in 0..count {
            let user = create_user(db, draft(&format!("user{}", index))).await.unwrap();
            ids.push(user.id);
        }

        ids
    }

    async fn friend_id_list(db: &SafeDb, user_id: UserId) -> Vec<UserId> {
        friends_of(db, user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.id)
            .collect()
    }

    #[tokio::test]
    async fn blank_name_defaults_to_login() {
        let db = mock_db();

        let user = create_user(&db, draft("neo")).await.unwrap();

        assert_eq!(user.name, "neo");
    }

    #[tokio::test]
    async fn update_requires_an_id() {
        let db = mock_db();

        assert!(matches!(
            update_user(&db, draft("neo")).await,
            Err(BackendError::MissingId)
        ));
    }

    #[tokio::test]
    async fn update_rejects_unknown_user() {
        let db = mock_db();

        let mut user = draft("neo");
        user.id = Some(42);

        assert!(matches!(
            update_user(&db, user).await,
            Err(BackendError::UserNotFound(42))
        ));
    }

    #[tokio::test]
    async fn delete_rejects_unknown_user() {
        let db = mock_db();

        assert!(matches!(
            delete_user(&db, 42).await,
            Err(BackendError::UserNotFound(42))
        ));
    }

    #[tokio::test]
    async fn a_request_is_one_directional() {
        let db = mock_db();
        let ids = seed_users(&db, 2).await;

        add_friend(&db, ids[0], ids[1]).await.unwrap();

        assert_eq!(friend_id_list(&db, ids[0]).await, vec![ids[1]]);
        assert!(friend_id_list(&db, ids[1]).await.is_empty());

        let edge = db.retrieve_friendship(ids[0], ids[1]).await.unwrap().unwrap();
        assert!(!edge.confirmed);
    }

    #[tokio::test]
    async fn a_reciprocal_request_confirms_both_edges() {
        let db = mock_db();
        let ids = seed_users(&db, 2).await;

        add_friend(&db, ids[0], ids[1]).await.unwrap();
        add_friend(&db, ids[1], ids[0]).await.unwrap();

        assert_eq!(friend_id_list(&db, ids[0]).await, vec![ids[1]]);
        assert_eq!(friend_id_list(&db, ids[1]).await, vec![ids[0]]);

        let forward = db.retrieve_friendship(ids[0], ids[1]).await.unwrap().unwrap();
        let reverse = db.retrieve_friendship(ids[1], ids[0]).await.unwrap().unwrap();
        assert!(forward.confirmed);
        assert!(reverse.confirmed);
    }

    #[tokio::test]
    async fn repeating_a_pending_request_changes_nothing() {
        let db = mock_db();
        let ids = seed_users(&db, 2).await;

        add_friend(&db, ids[0], ids[1]).await.unwrap();
        add_friend(&db, ids[0], ids[1]).await.unwrap();

        assert_eq!(friend_id_list(&db, ids[0]).await, vec![ids[1]]);

        let edge = db.retrieve_friendship(ids[0], ids[1]).await.unwrap().unwrap();
        assert!(!edge.confirmed);
    }

    #[tokio::test]
    async fn removal_demotes_the_reverse_edge() {
        let db = mock_db();
        let ids = seed_users(&db, 2).await;

        add_friend(&db, ids[0], ids[1]).await.unwrap();
        add_friend(&db, ids[1], ids[0]).await.unwrap();

        remove_friend(&db, ids[0], ids[1]).await.unwrap();

        assert!(friend_id_list(&db, ids[0]).await.is_empty());
        assert_eq!(friend_id_list(&db, ids[1]).await, vec![ids[0]]);

        let reverse = db.retrieve_friendship(ids[1], ids[0]).await.unwrap().unwrap();
        assert!(!reverse.confirmed);

        assert!(db.retrieve_friendship(ids[0], ids[1]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn removing_an_absent_edge_is_a_no_op() {
        let db = mock_db();
        let ids = seed_users(&db, 2).await;

        remove_friend(&db, ids[0], ids[1]).await.unwrap();

        assert!(friend_id_list(&db, ids[0]).await.is_empty());
    }

    #[tokio::test]
    async fn self_friendship_is_rejected() {
        let db = mock_db();
        let ids = seed_users(&db, 1).await;

        assert!(matches!(
            add_friend(&db, ids[0], ids[0]).await,
            Err(BackendError::SelfFriendship { .. })
        ));
        assert!(matches!(
            remove_friend(&db, ids[0], ids[0]).await,
            Err(BackendError::SelfFriendship { .. })
        ));
    }

    #[tokio::test]
    async fn both_users_must_exist() {
        let db = mock_db();
        let ids = seed_users(&db, 1).await;

        assert!(matches!(
            add_friend(&db, ids[0], 42).await,
            Err(BackendError::UserNotFound(42))
        ));
        assert!(matches!(
            add_friend(&db, 42, ids[0]).await,
            Err(BackendError::UserNotFound(42))
        ));
        assert!(matches!(
            friends_of(&db, 42).await,
            Err(BackendError::UserNotFound(42))
        ));
    }

    #[tokio::test]
    async fn common_friends_is_the_sorted_intersection() {
        let db = mock_db();
        let ids = seed_users(&db, 6).await;
        let (a, b) = (ids[0], ids[1]);

        // a knows 2, 3, 4; b knows 3, 4, 5
        for friend in &ids[2..5] {
            add_friend(&db, a, *friend).await.unwrap();
        }
        for friend in &ids[3..6] {
            add_friend(&db, b, *friend).await.unwrap();
        }

        let shared: Vec<UserId> = common_friends(&db, a, b)
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.id)
            .collect();

        assert_eq!(shared, vec![ids[3], ids[4]]);
    }

    #[tokio::test]
    async fn common_friends_with_a_stranger_is_empty() {
        let db = mock_db();
        let ids = seed_users(&db, 3).await;

        add_friend(&db, ids[0], ids[2]).await.unwrap();

        assert!(common_friends(&db, ids[0], ids[1]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_user_attaches_friends_and_likes() {
        let db = mock_db();
        let ids = seed_users(&db, 3).await;

        add_friend(&db, ids[0], ids[1]).await.unwrap();
        add_friend(&db, ids[0], ids[2]).await.unwrap();

        let user = get_user(&db, ids[0]).await.unwrap();

        assert_eq!(user.friends, vec![ids[1], ids[2]]);
        assert!(user.likes.is_empty());
    }
}

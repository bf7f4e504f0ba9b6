//! Conversation creation, listing and access checks.

use std::collections::BTreeSet;

use rusqlite::Connection;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use pd_core::error::{PdError, PdResult};
use pd_models::{Conversation, Database, Message, User};

use crate::event_bus::{AppEvent, EventBus};

/// A conversation with its members and messages.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participants: Vec<User>,
    pub messages: Vec<Message>,
}

/// Fail with `PermissionDenied` unless `user_id` belongs to the conversation.
pub(crate) fn require_participant(conn: &Connection, conversation_id: &Uuid, user_id: &Uuid) -> PdResult<()> {
    if Conversation::is_participant(conn, conversation_id, user_id)? {
        Ok(())
    } else {
        Err(PdError::PermissionDenied(
            "you are not a participant of this conversation".into(),
        ))
    }
}

/// Fetch a conversation the caller belongs to.
///
/// Missing conversations are `NotFound`; other people's are `PermissionDenied`.
pub(crate) fn load_for_participant(conn: &Connection, conversation_id: &Uuid, user_id: &Uuid) -> PdResult<Conversation> {
    let conversation = Conversation::find_by_id(conn, conversation_id)?
        .ok_or_else(|| PdError::not_found("conversation", conversation_id))?;
    require_participant(conn, conversation_id, user_id)?;
    Ok(conversation)
}

pub struct ConversationService {
    database: Database,
    event_bus: EventBus,
}

impl ConversationService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self { database, event_bus }
    }

    /// Start a conversation between `creator` and `participants`.
    ///
    /// The creator is always a member. Duplicate ids are collapsed and an
    /// unknown id rejects the whole request.
    pub fn create(&self, creator: &User, participants: &[Uuid]) -> PdResult<ConversationDetail> {
        if participants.is_empty() {
            return Err(PdError::Validation("participants must not be empty".into()));
        }
        let mut members: BTreeSet<Uuid> = participants.iter().copied().collect();
        members.insert(creator.user_id);

        let conversation = self.database.transaction(|conn| {
            for id in &members {
                if !User::exists(conn, id)? {
                    return Err(PdError::Validation(format!("unknown user: {id}")));
                }
            }
            let conversation = Conversation::new();
            conversation.insert(conn)?;
            for id in &members {
                conversation.add_participant(conn, id)?;
            }
            Ok(conversation)
        })?;

        info!(
            "{} created conversation {} with {} participants",
            creator.username,
            conversation.conversation_id,
            members.len()
        );
        self.event_bus.emit(AppEvent::ConversationCreated {
            conversation_id: conversation.conversation_id,
            participant_count: members.len(),
        });
        self.detail(&conversation)
    }

    /// One page of the user's conversations and the total count.
    pub fn list_for_user(&self, user: &User, limit: i64, offset: i64) -> PdResult<(Vec<Conversation>, i64)> {
        let conn = self.database.conn()?;
        let page = Conversation::list_for_user(&conn, &user.user_id, limit, offset)?;
        let total = Conversation::count_for_user(&conn, &user.user_id)?;
        Ok((page, total))
    }

    /// Members see the conversation with participants and messages.
    pub fn get(&self, viewer: &User, conversation_id: &Uuid) -> PdResult<ConversationDetail> {
        let conversation = {
            let conn = self.database.conn()?;
            load_for_participant(&conn, conversation_id, &viewer.user_id)?
        };
        self.detail(&conversation)
    }

    /// Members may delete the conversation with all its messages.
    pub fn delete(&self, viewer: &User, conversation_id: &Uuid) -> PdResult<()> {
        let conn = self.database.conn()?;
        load_for_participant(&conn, conversation_id, &viewer.user_id)?;
        Conversation::delete(&conn, conversation_id)?;
        info!("{} deleted conversation {conversation_id}", viewer.username);
        Ok(())
    }

    fn detail(&self, conversation: &Conversation) -> PdResult<ConversationDetail> {
        let conn = self.database.conn()?;
        Ok(ConversationDetail {
            conversation: conversation.clone(),
            participants: Conversation::participants(&conn, &conversation.conversation_id)?,
            messages: Message::list_for_conversation(&conn, &conversation.conversation_id)?,
        })
    }
}

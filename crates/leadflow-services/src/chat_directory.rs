//! Chat directory backed by the messaging platform's MongoDB `chats` collection

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::{Client, Collection};

use leadflow_core::models::{Chat, NewChat};
use leadflow_core::ChatDirectory;

const CHATS_COLLECTION: &str = "chats";

#[derive(Clone)]
pub struct MongoChatDirectory {
    chats: Collection<Document>,
}

impl MongoChatDirectory {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to connect to MongoDB")?;
        Ok(Self::from_client(&client, database))
    }

    pub fn from_client(client: &Client, database: &str) -> Self {
        Self {
            chats: client.database(database).collection(CHATS_COLLECTION),
        }
    }
}

fn chat_from_document(document: &Document) -> Result<Chat> {
    let id = document
        .get_object_id("_id")
        .context("chat document without _id")?
        .to_hex();
    let contact = document
        .get_document("contact")
        .context("chat document without contact")?;

    Ok(Chat {
        id,
        phone: contact.get_str("phone").unwrap_or_default().to_string(),
        account_id: document.get_i64("accountId").unwrap_or_default(),
        tenant_id: document.get_i64("companyId").unwrap_or_default(),
        lead_id: document.get_i64("leadId").ok(),
    })
}

#[async_trait]
impl ChatDirectory for MongoChatDirectory {
    #[tracing::instrument(skip(self, phones), fields(phones = phones.len()))]
    async fn find_chats_by_phones(
        &self,
        phones: &[String],
        account_id: i64,
        tenant_id: i64,
    ) -> Result<Vec<Chat>> {
        if phones.is_empty() {
            return Ok(Vec::new());
        }

        let filter = doc! {
            "contact.phone": { "$in": phones.to_vec() },
            "accountId": account_id,
            "companyId": tenant_id,
        };

        let documents: Vec<Document> = self
            .chats
            .find(filter)
            .await
            .context("Failed to query chats by phone")?
            .try_collect()
            .await
            .context("Failed to read chat cursor")?;

        documents.iter().map(chat_from_document).collect()
    }

    #[tracing::instrument(skip(self, chat), fields(account_id = chat.account_id, tenant_id = chat.tenant_id))]
    async fn create_chat(&self, chat: &NewChat) -> Result<String> {
        let now = BsonDateTime::now();
        let document = doc! {
            "contact": {
                "phone": chat.phone.as_str(),
                "dialCode": chat.dial_code.as_str(),
                "countryCode": chat.region_code.as_str(),
            },
            "accountId": chat.account_id,
            "companyId": chat.tenant_id,
            "createdAt": now,
            "updatedAt": now,
        };

        let inserted = self
            .chats
            .insert_one(document)
            .await
            .context("Failed to insert chat")?;

        inserted
            .inserted_id
            .as_object_id()
            .map(|id| id.to_hex())
            .context("MongoDB returned a non-ObjectId chat id")
    }

    #[tracing::instrument(skip(self))]
    async fn link_lead(&self, chat_id: &str, lead_id: i64) -> Result<()> {
        let id = ObjectId::parse_str(chat_id).context("Invalid chat id")?;

        self.chats
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "leadId": lead_id, "updatedAt": BsonDateTime::now() } },
            )
            .await
            .context("Failed to link chat to lead")?;

        Ok(())
    }
}

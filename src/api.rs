use crate::error::StoreError;
use crate::models::Task;
use crate::store::TaskStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

/// `TaskStore` backed by the REST task service.
#[derive(Clone)]
pub struct HttpTaskStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTaskStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> HttpTaskStore {
        HttpTaskStore {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn task_url(&self, id: u64) -> String {
        format!("{}/{}", self.base_url, id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

async fn check_status(res: Response) -> Result<Response, StoreError> {
    if res.status().is_success() {
        Ok(res)
    } else {
        let status = res.status().as_u16();
        let body = res.text().await?;
        Err(StoreError::Status { status, body })
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        debug!(url = %self.base_url, "fetching tasks");
        let res = self.authorize(self.client.get(&self.base_url)).send().await?;
        let tasks = check_status(res).await?.json::<Vec<Task>>().await?;
        Ok(tasks)
    }

    async fn create(&self, task: &Task) -> Result<Task, StoreError> {
        debug!(title = %task.title, "creating task");
        let res = self
            .authorize(self.client.post(&self.base_url))
            .json(task)
            .send()
            .await?;
        let created = check_status(res).await?.json::<Task>().await?;
        Ok(created)
    }

    async fn update(&self, task: &Task) -> Result<(), StoreError> {
        debug!(id = task.id, "updating task");
        let res = self
            .authorize(self.client.put(self.task_url(task.id)))
            .json(task)
            .send()
            .await?;
        // Acknowledgement only, the body is not read.
        check_status(res).await?;
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        debug!(id, "deleting task");
        let res = self
            .authorize(self.client.delete(self.task_url(id)))
            .send()
            .await?;
        check_status(res).await?;
        Ok(())
    }
}

//! HTTP client bound to an auth manager.
//!
//! Requests built here carry the session's authorization header. A 401 is
//! handed to the refresh coordinator and the request is replayed at most
//! once. The final response is returned as-is, so an unrecoverable 401 is an
//! `Ok` response with status 401, the same as any other HTTP error status
//! from `reqwest`.

use crate::manager::AuthManager;
use crate::operations::AuthOperations;
use crate::AuthResult;
use reqwest::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Authorized HTTP client.
pub struct AuthorizedClient<O: AuthOperations> {
    manager: AuthManager<O>,
}

impl<O: AuthOperations> Clone for AuthorizedClient<O> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
        }
    }
}

impl<O: AuthOperations> AuthorizedClient<O> {
    pub(crate) fn new(manager: AuthManager<O>) -> Self {
        Self { manager }
    }

    pub fn get(&self, url: &str) -> AuthorizedRequestBuilder<O> {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> AuthorizedRequestBuilder<O> {
        self.request(Method::POST, url)
    }

    pub fn put(&self, url: &str) -> AuthorizedRequestBuilder<O> {
        self.request(Method::PUT, url)
    }

    pub fn patch(&self, url: &str) -> AuthorizedRequestBuilder<O> {
        self.request(Method::PATCH, url)
    }

    pub fn delete(&self, url: &str) -> AuthorizedRequestBuilder<O> {
        self.request(Method::DELETE, url)
    }

    pub fn request(&self, method: Method, url: &str) -> AuthorizedRequestBuilder<O> {
        AuthorizedRequestBuilder {
            manager: self.manager.clone(),
            builder: self.manager.http_client().request(method, url),
        }
    }

    /// Execute a prebuilt request with authorization and 401 recovery.
    ///
    /// Requests whose body cannot be cloned (streams) are sent once and never
    /// replayed.
    pub async fn execute(&self, request: Request) -> AuthResult<Response> {
        let replay = request.try_clone();
        let (response, sent_header) = self.manager.send_authorized(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        match replay {
            Some(replay) => {
                self.manager
                    .recover_unauthorized(replay, sent_header, response)
                    .await
            }
            None => {
                debug!("401 on a request that cannot be replayed");
                Ok(response)
            }
        }
    }
}

/// Request builder for [`AuthorizedClient`].
pub struct AuthorizedRequestBuilder<O: AuthOperations> {
    manager: AuthManager<O>,
    builder: reqwest::RequestBuilder,
}

impl<O: AuthOperations> AuthorizedRequestBuilder<O> {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    pub fn body(mut self, body: impl Into<reqwest::Body>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.builder = self.builder.timeout(timeout);
        self
    }

    pub async fn send(self) -> AuthResult<Response> {
        let request = self.builder.build()?;
        AuthorizedClient::new(self.manager).execute(request).await
    }
}

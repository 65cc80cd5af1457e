//! Built-in scenario catalog.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use crate::recorder::{RecordError, RecordSession, Request, Scenario};
use crate::store::ScenarioId;
use crate::temporary_repository::TemporaryRepository;

/// Domain of every built-in scenario.
pub const GITHUB_DOMAIN: &str = "api.github.com";

/// Repository every read-only scenario reads from.
pub const HELLO_WORLD_REPOSITORY: &str = "hello-world";

/// All built-in scenarios, sorted by id.
#[must_use]
pub fn all() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(CreateFile),
        Box::new(GetOrganization),
        Box::new(GetRepository),
        Box::new(GetRoot),
    ]
}

/// Looks up a built-in scenario.
#[must_use]
pub fn find(id: &ScenarioId) -> Option<Box<dyn Scenario>> {
    all().into_iter().find(|scenario| &scenario.id() == id)
}

fn github(title: &str) -> ScenarioId {
    ScenarioId::new(GITHUB_DOMAIN, title)
}

/// `GET /`
#[derive(Debug, Clone, Copy)]
pub struct GetRoot;

impl Scenario for GetRoot {
    fn id(&self) -> ScenarioId {
        github("get-root")
    }

    fn record(&self, session: &mut RecordSession<'_>) -> Result<(), RecordError> {
        session.request(Request::get("/"))?;
        Ok(())
    }
}

/// `GET /orgs/{org}`
#[derive(Debug, Clone, Copy)]
pub struct GetOrganization;

impl Scenario for GetOrganization {
    fn id(&self) -> ScenarioId {
        github("get-organization")
    }

    fn record(&self, session: &mut RecordSession<'_>) -> Result<(), RecordError> {
        let path = format!("/orgs/{}", session.organization());
        session.request(Request::get(path))?;
        Ok(())
    }
}

/// `GET /repos/{org}/hello-world`
#[derive(Debug, Clone, Copy)]
pub struct GetRepository;

impl Scenario for GetRepository {
    fn id(&self) -> ScenarioId {
        github("get-repository")
    }

    fn record(&self, session: &mut RecordSession<'_>) -> Result<(), RecordError> {
        let path = format!("/repos/{}/{HELLO_WORLD_REPOSITORY}", session.organization());
        session.request(Request::get(path))?;
        Ok(())
    }
}

/// Creates `test.txt` in a temporary repository.
///
/// Creating and deleting the repository are marked as ignored, so the
/// normalized fixtures hold only the `PUT` of the file.
#[derive(Debug, Clone, Copy)]
pub struct CreateFile;

impl Scenario for CreateFile {
    fn id(&self) -> ScenarioId {
        github("create-file")
    }

    fn record(&self, session: &mut RecordSession<'_>) -> Result<(), RecordError> {
        let org = session.organization().to_string();
        let repository = TemporaryRepository::new(self.id().title(), session.started_at());

        session.request(
            Request::post(format!("/orgs/{org}/repos"))
                .json(json!({ "name": repository.name(), "auto_init": true }))
                .ignored(),
        )?;

        let result = session.request(
            Request::put(format!("/repos/{org}/{}/contents/test.txt", repository.name())).json(
                json!({
                    "message": "create test.txt",
                    "content": STANDARD.encode("Hello World"),
                }),
            ),
        );

        // Delete the repository even if creating the file failed.
        let cleanup =
            session.request(Request::delete(format!("/repos/{org}/{}", repository.name())).ignored());
        result?;
        cleanup?;
        Ok(())
    }
}

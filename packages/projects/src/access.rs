//! Authorization evaluator.
//!
//! Pure decision functions over a [`Principal`] and a project's owning
//! fields. They never perform IO and never error; callers translate a
//! `false` into the appropriate denial before touching anything.

use tandem_core::{Principal, Role};

use crate::types::Project;

/// Whether the principal may mutate the project and its tasks, folders,
/// and documents.
///
/// Admins manage everything. A project manager manages only projects whose
/// `manager_id` is their own id -- an unassigned manager has no access at
/// all, not even read.
pub fn can_manage_project(principal: &Principal, project: &Project) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::ProjectManager => project.manager_id.as_deref() == Some(principal.id.as_str()),
        Role::Client => false,
    }
}

/// Whether the principal may read the project.
///
/// Managing implies viewing; otherwise the principal must be the project's
/// client.
pub fn can_view_project(principal: &Principal, project: &Project) -> bool {
    can_manage_project(principal, project)
        || project.client_id.as_deref() == Some(principal.id.as_str())
}

use askama::Template;

use crate::models::field_service::FieldServiceListItem;
use crate::models::group::GroupListItem;
use crate::models::visitor::Visitor;
use super::{PageContext, SelectOption};

/// A checkbox in a multi-select group (privileges, assignment permissions).
#[derive(Debug, Clone)]
pub struct CheckboxOption {
    pub value: String,
    pub label: String,
    pub checked: bool,
}

pub struct PublisherListRow {
    pub id: i64,
    pub display_name: String,
    pub gender: String,
    pub group_name: String,
    pub permissions: Vec<String>,
}

#[derive(Template)]
#[template(path = "publishers/list.html")]
pub struct PublisherListTemplate {
    pub ctx: PageContext,
    pub publishers: Vec<PublisherListRow>,
}

/// Absence period as shown in the form; dates stay strings so a rejected
/// submission is redisplayed as typed.
#[derive(Debug, Clone, Default)]
pub struct AbsenceRow {
    pub start_date: String,
    pub end_date: String,
    pub reason: String,
}

#[derive(Template)]
#[template(path = "publishers/form.html")]
pub struct PublisherFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub username: String,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub address: String,
    pub genders: Vec<SelectOption>,
    pub groups: Vec<SelectOption>,
    pub privileges: Vec<CheckboxOption>,
    pub permissions: Vec<CheckboxOption>,
    pub absences: Vec<AbsenceRow>,
    pub has_login: bool,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "visitors/list.html")]
pub struct VisitorListTemplate {
    pub ctx: PageContext,
    pub visitors: Vec<Visitor>,
}

#[derive(Template)]
#[template(path = "visitors/form.html")]
pub struct VisitorFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub visitor: Visitor,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "groups/list.html")]
pub struct GroupListTemplate {
    pub ctx: PageContext,
    pub groups: Vec<GroupListItem>,
}

#[derive(Template)]
#[template(path = "groups/form.html")]
pub struct GroupFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub name: String,
    pub overseers: Vec<SelectOption>,
    pub assistants: Vec<SelectOption>,
    pub errors: Vec<String>,
}

pub struct TalkListRow {
    pub id: i64,
    pub numbered_title: String,
    pub last_delivered: String,
    pub delivery_count: usize,
}

#[derive(Template)]
#[template(path = "talks/list.html")]
pub struct TalkListTemplate {
    pub ctx: PageContext,
    pub talks: Vec<TalkListRow>,
}

#[derive(Template)]
#[template(path = "talks/form.html")]
pub struct TalkFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub number: String,
    pub title: String,
    pub deliveries: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "field_service/list.html")]
pub struct FieldServiceListTemplate {
    pub ctx: PageContext,
    pub meetings: Vec<FieldServiceListItem>,
}

#[derive(Template)]
#[template(path = "field_service/form.html")]
pub struct FieldServiceFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub notes: String,
    pub groups: Vec<SelectOption>,
    pub conductors: Vec<SelectOption>,
    pub errors: Vec<String>,
}

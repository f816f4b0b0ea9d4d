pub mod crud;
pub mod form;
pub mod list;
pub mod save;

pub use crud::{create, delete, edit_form, new_form, update};
pub use list::{list, list_items};
pub use save::{FieldMessage, SaveOutcome, save_week};

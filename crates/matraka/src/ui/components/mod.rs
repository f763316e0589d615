pub mod chat_view;
pub mod detail;
pub mod macro_list;
pub mod variable_form;

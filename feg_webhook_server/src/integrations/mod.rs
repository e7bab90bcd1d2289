pub mod email;
pub mod email_templates;

mod subscriber_email;
// allow external `use` statements to skip `subscriber_email`
pub use subscriber_email::is_email_whitespace;
pub use subscriber_email::SubscriberEmail;

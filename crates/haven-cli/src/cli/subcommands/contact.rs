use clap::Subcommand;

/// Trusted contact commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ContactCommands {
    /// Add a trusted contact.
    Add {
        /// Display name.
        name: String,
        /// Phone number; spaces, dashes and parentheses are ignored.
        phone: String,
    },
    /// List your trusted contacts.
    List,
    /// Remove a trusted contact. Sessions already started keep their recipients.
    Remove {
        /// Contact ID.
        id: String,
    },
}

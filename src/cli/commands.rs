use clap::{Parser, Subcommand};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "library", version, about = "Library Borrowing System CLI")]
pub struct Cli {
    /// Database URL, overrides DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new book to the library
    AddBook {
        /// Book title
        #[arg(short, long)]
        title: String,

        /// Book author
        #[arg(short, long)]
        author: String,
    },

    /// Add a new member to the library
    AddMember {
        /// Member name
        #[arg(short, long)]
        name: String,
    },

    /// Borrow a book
    Borrow {
        /// Book ID
        #[arg(short, long)]
        book_id: i64,

        /// Member ID
        #[arg(short, long)]
        member_id: i64,
    },

    /// Return a borrowed book
    Return {
        /// Book ID
        #[arg(short, long)]
        book_id: i64,

        /// Member ID
        #[arg(short, long)]
        member_id: i64,
    },

    /// Search for books
    Search {
        /// Search by title
        #[arg(short, long)]
        title: Option<String>,

        /// Search by author
        #[arg(short, long)]
        author: Option<String>,
    },

    /// List books borrowed by a member
    MemberBooks {
        /// Member ID
        #[arg(short, long)]
        member_id: i64,
    },

    /// Show a member and the books they currently hold
    Member {
        /// Member ID
        #[arg(short, long)]
        member_id: i64,
    },

    /// Show the borrow history of a book
    History {
        /// Book ID
        #[arg(short, long)]
        book_id: i64,
    },

    /// Show library statistics
    Stats,

    /// List all books in the library
    ListBooks,
}

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use inquire::Text;

use crate::config::Settings;
use crate::runtime::{self, StartupError};
use crate::service::assistant::{render_slots, Assistant};

#[derive(Parser)]
#[command(name = "bookingBot", about = "Book meetings and check free slots from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Book an event directly on the calendar.
    Book {
        title: String,
        start: String,
        end: String,
    },
    /// List free slots for today, or for the working hours of --date.
    Slots {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Send one chat message to the assistant.
    Ask { text: String },
    /// Interactive chat session.
    Chat {},
}

pub async fn cli(settings: Settings) -> Result<(), StartupError> {
    // Fine to exit on bad arguments here
    let cli = Cli::parse();
    match &cli.command {
        Commands::Book { title, start, end } => {
            let booking = runtime::build_booking_service(&settings)?;
            match booking.book_raw(title, start, end).await {
                Ok(result) => println!("Booked {} -> {}", result.event_id, result.event_link),
                Err(e) => println!("Failed to book event: {}", e.user_message()),
            }
        }
        Commands::Slots { date } => {
            let booking = runtime::build_booking_service(&settings)?;
            match booking.slot_labels(*date, Utc::now()).await {
                Ok(slots) => println!("{}", render_slots(&slots)),
                Err(e) => println!("Failed to fetch slots: {}", e.user_message()),
            }
        }
        Commands::Ask { text } => {
            let assistant = runtime::build_assistant(&settings)?;
            println!("{}", assistant.handle_message(text).await);
        }
        Commands::Chat {} => {
            let assistant = runtime::build_assistant(&settings)?;
            chat_loop(&assistant).await;
        }
    }
    Ok(())
}

async fn chat_loop(assistant: &Assistant) {
    println!("Ask me to book meetings like:");
    println!("  Book Team Sync from 2025-07-07T15:00:00 to 2025-07-07T16:00:00");
    println!("  What time am I free today?");
    println!("Empty line or 'exit' to quit.");
    loop {
        let input = match Text::new("What would you like to book or check?").prompt() {
            Ok(input) => input,
            Err(_) => break,
        };
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case("exit") {
            break;
        }
        println!("{}", assistant.handle_message(input).await);
    }
}

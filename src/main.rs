mod client;
mod error;
mod history;
mod models;
mod parser;
mod stats;

use std::path::Path;

use dotenv::dotenv;
use log::{error, info};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use crate::client::SessionClient;
use crate::error::Error;
use crate::history::diff_grades;
use crate::models::{Credentials, GradeRecord, DEFAULT_WEIGHT};
use crate::stats::{running_averages, subject_averages, tidy_subject, weighted_average};

const SNAPSHOT_FILE: &str = "grades.json";

fn main() {
    // Loads environment variables from a `.env` file, if present.
    dotenv().ok();

    // Initializes logging with simplelog to the terminal with mixed output (both stdout and stderr) and automatic color support.
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    // The endpoint differs per school, so the register URL comes from the environment.
    let api = match std::env::var("MASTERCOM_URL") {
        Ok(url) => url,
        Err(_) => {
            error!("MASTERCOM_URL environment variable not found");
            return;
        }
    };
    let credentials = match read_credentials() {
        Some(credentials) => credentials,
        None => {
            error!("MASTERCOM_USERNAME or MASTERCOM_PASSWORD environment variable not found");
            return;
        }
    };

    let client = match SessionClient::new(api) {
        Ok(client) => client,
        Err(e) => {
            error!("Error building the session client: {}", e);
            return;
        }
    };

    // Authenticates against the register and keeps the session tokens for the grades request.
    let tokens = match client.login(&credentials) {
        Ok(tokens) => {
            info!("Login successful");
            tokens
        }
        Err(Error::Login(_)) => {
            error!("Login failed, check your username and password");
            return;
        }
        Err(Error::Request(e)) => {
            error!("Connection error during login, check your connection and retry: {}", e);
            return;
        }
        Err(e) => {
            error!("Unknown error during login: {}", e);
            return;
        }
    };

    // Retrieves and parses the grades page into structured records, oldest first.
    let grades = match client.fetch_grades(&tokens) {
        Ok(grades) => {
            info!("Grades retrieved successfully");
            grades
        }
        Err(Error::Login(_)) => {
            error!("Session expired or invalid, log in again");
            return;
        }
        Err(Error::Request(e)) => {
            error!("Connection error while retrieving grades, check your connection and retry: {}", e);
            return;
        }
        Err(e) => {
            error!("Unknown error while retrieving grades: {}", e);
            return;
        }
    };

    if grades.is_empty() {
        info!("No grades found in the register");
        return;
    }

    // The register decorates some subject names with punctuation; strip it before grouping.
    let grades: Vec<GradeRecord> = grades
        .into_iter()
        .map(|mut grade| {
            grade.subject = tidy_subject(&grade.subject);
            grade
        })
        .collect();

    // Compares with the snapshot from the previous run to point out new grades.
    match diff_grades(Path::new(SNAPSHOT_FILE), &grades) {
        Ok(new_grades) => {
            for grade in &new_grades {
                info!("New grade: {} in {}", grade.value, grade.subject);
            }
        }
        Err(e) => error!("Error computing grade differences: {}", e),
    }

    print_report(&grades);
}

fn read_credentials() -> Option<Credentials> {
    let username = std::env::var("MASTERCOM_USERNAME").ok()?;
    let password = std::env::var("MASTERCOM_PASSWORD").ok()?;
    Some(Credentials { username, password })
}

// Prints the chronology, the overall and per-subject averages and the
// running-average series, mirroring what the old desktop app displayed.
fn print_report(grades: &[GradeRecord]) {
    println!("Voti (newest first):");
    for grade in grades.iter().rev() {
        if grade.weight == DEFAULT_WEIGHT {
            println!("  {} - {}", grade.value, grade.subject);
        } else {
            println!("  {} (peso {}%) - {}", grade.value, grade.weight, grade.subject);
        }
    }

    match weighted_average(grades) {
        Some(average) => println!("\nMedia: {:.2}", average),
        None => println!("\nMedia: n/a"),
    }

    println!("\nMedia per materia:");
    for (subject, average) in subject_averages(grades) {
        println!("  {}: {:.2}", subject, average);
    }

    let trend: Vec<String> = running_averages(grades)
        .iter()
        .map(|average| format!("{:.2}", average))
        .collect();
    println!("\nAndamento media: {}", trend.join(" -> "));
}

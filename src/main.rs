//! # Plume CLI
//!
//! Usage:
//!   plume input.json -o output.pdf
//!   echo '{ ... }' | plume -o output.pdf
//!   plume --example > report.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).unwrap_or_else(|e| fail(&format!("cannot read {}: {}", args[1], e)))
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            fail(&format!("cannot read stdin: {}", e));
        }
        buf
    };

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "output.pdf".to_string());

    match plume::render_json(&input) {
        Ok(pdf_bytes) => {
            if let Err(e) = fs::write(&output_path, &pdf_bytes) {
                fail(&format!("cannot write {}: {}", output_path, e));
            }
            eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
        }
        Err(e) => fail(&e.to_string()),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("✗ {}", message);
    process::exit(1);
}

fn example_report_json() -> &'static str {
    r##"{
  "config": {
    "pageSize": "A4",
    "metadata": { "title": "Quarterly Report", "author": "Plume" }
  },
  "prototypes": {
    "h1": {
      "type": "text",
      "attributes": { "font-size": 24, "font-style": "bold", "margin-bottom": 12 }
    },
    "h2": {
      "type": "text",
      "attributes": { "font-size": 14, "font-style": "bold", "margin": "16 0 6 0" }
    },
    "note": {
      "type": "container",
      "attributes": { "padding": "8" },
      "enhancements": {
        "background": { "color": "#f4f4f8" },
        "border": { "color": "#c0c0d0", "width": 0.5 }
      }
    }
  },
  "pages": [
    {
      "type": "page",
      "attributes": { "padding": "54" },
      "placeholders": {
        "footer": {
          "type": "text",
          "text": "Plume sample report",
          "attributes": { "font-size": 8, "color": "#777777", "margin-bottom": 24 }
        }
      },
      "children": [
        { "type": "h1", "text": "Quarterly Report" },
        {
          "type": "p",
          "text": "Revenue grew in every region this quarter. The sections below break the numbers down by product line and list the follow-ups agreed in the review meeting.",
          "attributes": { "font-size": 11, "line-height": 16 }
        },
        { "type": "h2", "text": "Highlights" },
        {
          "type": "note",
          "children": [
            {
              "type": "p",
              "text": "Subscriptions passed one million active accounts. Churn fell for the third quarter in a row.",
              "attributes": { "font-size": 10, "line-height": 14 }
            }
          ]
        },
        { "type": "h2", "text": "Follow-ups" },
        {
          "type": "p",
          "text": "Finance prepares the regional breakdown. Product publishes the roadmap update before the next review.",
          "attributes": { "font-size": 11, "line-height": 16 },
          "enhancements": { "border": { "style": "dashed" } }
        }
      ]
    }
  ]
}"##
}

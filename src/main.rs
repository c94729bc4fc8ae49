//! # Quire CLI
//!
//! Usage:
//!   quire input.json -o output.pdf
//!   echo '{ ... }' | quire -o output.pdf
//!   quire input.json --plan > plan.json
//!   quire --example > report.json
//!
//! Set `RUST_LOG=debug` to trace page and table decisions.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1])
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map(|_| buf)
    };
    let input = match input {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ Failed to read input: {}", e);
            process::exit(1);
        }
    };

    if args.iter().any(|a| a == "--plan") {
        match quire::layout_json(&input) {
            Ok(plan) => println!("{}", plan),
            Err(e) => {
                eprintln!("✗ {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "output.pdf".to_string());

    match quire::render_json(&input) {
        Ok(pdf_bytes) => {
            if let Err(e) = fs::write(&output_path, &pdf_bytes) {
                eprintln!("✗ Failed to write {}: {}", output_path, e);
                process::exit(1);
            }
            eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            process::exit(1);
        }
    }
}

fn example_report_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Quarterly Report",
    "author": "Quire"
  },
  "defaultPage": {
    "pageSize": "A4",
    "topMargin": "2cm",
    "bottomMargin": "2cm",
    "leftMargin": "2.5cm",
    "rightMargin": "2.5cm"
  },
  "sections": [
    {
      "blocks": [
        {
          "type": "Paragraph",
          "runs": [{ "text": "Quarterly Report", "font": { "size": 24, "bold": true } }],
          "format": { "spaceAfter": 12, "keepWithNext": true }
        },
        {
          "type": "Paragraph",
          "runs": [
            { "text": "Revenue grew in every region this quarter. " },
            { "text": "Details follow.", "font": { "italic": true } }
          ],
          "format": { "alignment": "Justify", "spaceAfter": 12 }
        },
        {
          "type": "Table",
          "format": {
            "borders": { "visible": true, "width": 0.5, "color": "Gray" },
            "topPadding": 3,
            "bottomPadding": 3
          },
          "columns": [{ "width": "6cm" }, {}, {}],
          "rows": [
            {
              "format": { "heading": true, "shading": { "color": "LightGray" } },
              "cells": [
                { "paragraphs": [{ "runs": [{ "text": "Region", "font": { "bold": true } }] }] },
                { "paragraphs": [{ "runs": [{ "text": "Q1", "font": { "bold": true } }] }] },
                { "paragraphs": [{ "runs": [{ "text": "Q2", "font": { "bold": true } }] }] }
              ]
            },
            {
              "cells": [
                { "paragraphs": [{ "runs": [{ "text": "North" }] }], "mergeDown": 1 },
                { "paragraphs": [{ "runs": [{ "text": "1,200" }] }] },
                { "paragraphs": [{ "runs": [{ "text": "1,450" }] }] }
              ]
            },
            {
              "cells": [
                {},
                { "paragraphs": [{ "runs": [{ "text": "Projected: 1,500" }] }], "mergeRight": 1 },
                {}
              ]
            },
            {
              "format": { "heightRule": "Exactly", "height": 40, "verticalAlignment": "Center" },
              "cells": [
                { "paragraphs": [{ "runs": [{ "text": "South" }] }] },
                { "paragraphs": [{ "runs": [{ "text": "900" }] }] },
                { "paragraphs": [{ "runs": [{ "text": "1,020" }] }] }
              ]
            }
          ]
        },
        {
          "type": "Paragraph",
          "runs": [{ "text": "Outlook" , "font": { "size": 14, "bold": true } }],
          "format": { "spaceBefore": "1cm", "spaceAfter": 6, "keepWithNext": true }
        },
        {
          "type": "Paragraph",
          "runs": [{ "text": "We expect steady growth through the end of the year." }],
          "format": {
            "borders": { "left": { "visible": true, "width": 2, "color": "Navy" } },
            "leftIndent": 6
          }
        }
      ]
    }
  ]
}"##
}

//! Prompt commands.
//!
//! Input lines parse into the closed `Command` enum; anything unrecognized
//! becomes `Command::Invalid` with a message for the user.

/// Words that end the session.
pub const QUIT_COMMANDS: [&str; 3] = ["q", "exit", "quit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Countries,
    Variables,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Sync,
    Plot {
        variables: Vec<String>,
        entities: Vec<String>,
    },
    List(Vec<ListTarget>),
    Quit,
    /// Blank line.
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let mut words = input.split_whitespace();
        let Some(command) = words.next() else {
            return Command::Empty;
        };
        let args: Vec<&str> = words.collect();

        if QUIT_COMMANDS.contains(&command) {
            return Command::Quit;
        }

        match command {
            "help" => Command::Help,
            "sync" => Command::Sync,
            "plot" => Self::parse_plot(&args),
            "list" => Self::parse_list(&args),
            other => Command::Invalid(format!("command '{}' not understood", other)),
        }
    }

    /// `plot <variables...> for <countries...>`
    fn parse_plot(args: &[&str]) -> Self {
        let Some(split) = args.iter().position(|w| *w == "for") else {
            return Command::Invalid("incomplete command, missing the 'for' argument.".into());
        };
        let variables: Vec<String> = args[..split].iter().map(|s| s.to_string()).collect();
        let entities: Vec<String> = args[split + 1..].iter().map(|s| s.to_string()).collect();

        if variables.is_empty() || entities.is_empty() {
            return Command::Invalid(
                "plot needs at least one variable before 'for' and one country after it.".into(),
            );
        }
        Command::Plot { variables, entities }
    }

    fn parse_list(args: &[&str]) -> Self {
        if args.is_empty() {
            return Command::Invalid("list what? try 'list countries' or 'list variables'.".into());
        }
        let mut targets = Vec::with_capacity(args.len());
        for arg in args {
            match *arg {
                "countries" => targets.push(ListTarget::Countries),
                "variables" => targets.push(ListTarget::Variables),
                other => return Command::Invalid(format!("unknown variable '{}'", other)),
            }
        }
        Command::List(targets)
    }
}

pub fn help_text() -> &'static str {
    "\
### COMMAND: sync
  Download every country whose cached data is older than today.
  Press Ctrl+C during a sync to stop after the current country.

### COMMAND: plot
  plot <variable> [variable ...] for <country> [country ...]
  Show the 7-day average of the variables for the countries.
  Countries are given by name or slug; unknown names are reported and skipped.

### COMMAND: list
  list countries | variables
  Print the available countries or variables.

### COMMAND: help
  Print this message.

### COMMAND: q | exit | quit
  Leave the prompt.
"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("  sync  "), Command::Sync);
        assert_eq!(Command::parse(""), Command::Empty);
        for quit in QUIT_COMMANDS {
            assert_eq!(Command::parse(quit), Command::Quit);
        }
    }

    #[test]
    fn test_parse_plot() {
        assert_eq!(
            Command::parse("plot confirmed deaths for italy france"),
            Command::Plot {
                variables: strings(&["confirmed", "deaths"]),
                entities: strings(&["italy", "france"]),
            }
        );
    }

    #[test]
    fn test_parse_plot_without_for() {
        assert!(matches!(
            Command::parse("plot confirmed italy"),
            Command::Invalid(msg) if msg.contains("'for'")
        ));
    }

    #[test]
    fn test_parse_plot_empty_side() {
        assert!(matches!(Command::parse("plot for italy"), Command::Invalid(_)));
        assert!(matches!(Command::parse("plot deaths for"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            Command::parse("list variables countries"),
            Command::List(vec![ListTarget::Variables, ListTarget::Countries])
        );
        assert_eq!(
            Command::parse("list planets"),
            Command::Invalid("unknown variable 'planets'".into())
        );
        assert!(matches!(Command::parse("list"), Command::Invalid(_)));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("draw deaths"),
            Command::Invalid("command 'draw' not understood".into())
        );
    }
}

//! Terminal command grammar.

use core::str::FromStr;

use stockroom_core::ProductId;
use stockroom_products::AlertFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Products,
    Find(String),
    Add(ProductId),
    Set(ProductId, i64),
    Inc(ProductId),
    Dec(ProductId),
    Remove(ProductId),
    Clear,
    Cart,
    Checkout,
    DropCommitted,
    Alerts(AlertFilter),
    Stats,
    Today,
    Reorder,
    Restock(ProductId, u32),
    Reload,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{command}`: bad {argument}: {reason}")]
    InvalidArgument {
        command: &'static str,
        argument: &'static str,
        reason: String,
    },

    #[error("`{0}` takes no further arguments")]
    TrailingArguments(&'static str),
}

pub const HELP: &str = "\
products              list the catalog
find <term>           search by name or SKU
add <id>              add one unit to the cart
set <id> <qty>        set a cart line's quantity (0 removes it)
inc <id> | dec <id>   change a cart line by one
rm <id>               remove a cart line
clear                 empty the cart
cart                  show the cart and its totals
checkout              record the sale and update stock
drop-committed        drop lines the last checkout already recorded
alerts [all|out|low]  stock alerts
stats                 sales and inventory figures
today                 today's sales from the ledger
reorder               products at or below the reorder threshold
restock <id> <qty>    set a product's stock count
reload                refetch products and sales
help                  this text
quit                  leave";

struct Args<'a> {
    command: &'static str,
    rest: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn next(&mut self, argument: &'static str) -> Result<&'a str, CommandParseError> {
        self.rest.next().ok_or(CommandParseError::MissingArgument {
            command: self.command,
            argument,
        })
    }

    fn parse<T>(&mut self, argument: &'static str) -> Result<T, CommandParseError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.next(argument)?;
        raw.parse().map_err(|e: T::Err| CommandParseError::InvalidArgument {
            command: self.command,
            argument,
            reason: e.to_string(),
        })
    }

    fn product_id(&mut self) -> Result<ProductId, CommandParseError> {
        self.parse("a product id")
    }

    fn done(mut self, command: Command) -> Result<Command, CommandParseError> {
        match self.rest.next() {
            Some(_) => Err(CommandParseError::TrailingArguments(self.command)),
            None => Ok(command),
        }
    }
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, tail) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        if head.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let name: &'static str = match head.to_ascii_lowercase().as_str() {
            "products" | "ls" => "products",
            "find" => "find",
            "add" => "add",
            "set" => "set",
            "inc" => "inc",
            "dec" => "dec",
            "rm" | "remove" => "rm",
            "clear" => "clear",
            "cart" => "cart",
            "checkout" => "checkout",
            "drop-committed" => "drop-committed",
            "alerts" => "alerts",
            "stats" => "stats",
            "today" => "today",
            "reorder" => "reorder",
            "restock" => "restock",
            "reload" => "reload",
            "help" | "?" => "help",
            "quit" | "exit" => "quit",
            _ => return Err(CommandParseError::Unknown(head.to_string())),
        };

        let mut args = Args {
            command: name,
            rest: tail.split_whitespace(),
        };

        match name {
            "find" => {
                let term = tail.trim();
                if term.is_empty() {
                    return Err(CommandParseError::MissingArgument {
                        command: name,
                        argument: "a search term",
                    });
                }
                Ok(Command::Find(term.to_string()))
            }
            "add" => {
                let id = args.product_id()?;
                args.done(Command::Add(id))
            }
            "set" => {
                let id = args.product_id()?;
                let quantity = args.parse("quantity")?;
                args.done(Command::Set(id, quantity))
            }
            "inc" => {
                let id = args.product_id()?;
                args.done(Command::Inc(id))
            }
            "dec" => {
                let id = args.product_id()?;
                args.done(Command::Dec(id))
            }
            "rm" => {
                let id = args.product_id()?;
                args.done(Command::Remove(id))
            }
            "alerts" => {
                let filter = match args.rest.next() {
                    Some(raw) => raw.parse().map_err(|e: stockroom_core::DomainError| {
                        CommandParseError::InvalidArgument {
                            command: name,
                            argument: "filter",
                            reason: e.to_string(),
                        }
                    })?,
                    None => AlertFilter::All,
                };
                args.done(Command::Alerts(filter))
            }
            "restock" => {
                let id = args.product_id()?;
                let quantity = args.parse("quantity")?;
                args.done(Command::Restock(id, quantity))
            }
            "products" => args.done(Command::Products),
            "clear" => args.done(Command::Clear),
            "cart" => args.done(Command::Cart),
            "checkout" => args.done(Command::Checkout),
            "drop-committed" => args.done(Command::DropCommitted),
            "stats" => args.done(Command::Stats),
            "today" => args.done(Command::Today),
            "reorder" => args.done(Command::Reorder),
            "reload" => args.done(Command::Reload),
            "help" => args.done(Command::Help),
            _ => args.done(Command::Quit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandParseError> {
        line.parse()
    }

    #[test]
    fn parses_cart_commands() {
        assert_eq!(parse("add 3"), Ok(Command::Add(ProductId::new(3))));
        assert_eq!(parse("  SET 3 5 "), Ok(Command::Set(ProductId::new(3), 5)));
        assert_eq!(parse("set 3 0"), Ok(Command::Set(ProductId::new(3), 0)));
        assert_eq!(parse("rm 4"), Ok(Command::Remove(ProductId::new(4))));
        assert_eq!(parse("checkout"), Ok(Command::Checkout));
        assert_eq!(parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn find_keeps_the_whole_term() {
        assert_eq!(parse("find usb c cable"), Ok(Command::Find("usb c cable".into())));
        assert!(matches!(
            parse("find   "),
            Err(CommandParseError::MissingArgument { command: "find", .. })
        ));
    }

    #[test]
    fn alerts_filter_is_optional() {
        assert_eq!(parse("alerts"), Ok(Command::Alerts(AlertFilter::All)));
        assert_eq!(parse("alerts out"), Ok(Command::Alerts(AlertFilter::OutOfStock)));
        assert!(matches!(
            parse("alerts soon"),
            Err(CommandParseError::InvalidArgument { command: "alerts", .. })
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse(""), Err(CommandParseError::Empty));
        assert_eq!(parse("sell 3"), Err(CommandParseError::Unknown("sell".into())));
        assert!(matches!(
            parse("add"),
            Err(CommandParseError::MissingArgument { command: "add", .. })
        ));
        assert!(matches!(
            parse("add -2"),
            Err(CommandParseError::InvalidArgument { command: "add", .. })
        ));
        assert!(matches!(
            parse("restock 2 lots"),
            Err(CommandParseError::InvalidArgument { command: "restock", .. })
        ));
        assert_eq!(parse("cart now"), Err(CommandParseError::TrailingArguments("cart")));
    }
}

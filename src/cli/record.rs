use std::io::{Write as _, stdout};

use airtable::{Record, SearchSpec};
use anyhow::bail;
use tabwriter::TabWriter;

use crate::cli::{Cli, KeyValue, Output, criteria, fields};

#[derive(Debug, clap::Args)]
pub(crate) struct GetArgs {
    /// Table name or ID
    pub table: String,
    /// Record ID
    pub id: String,
}

#[derive(Debug, clap::Args)]
pub(crate) struct FindArgs {
    /// Table name or ID
    pub table: String,
    /// Only show records where field=value (repeatable)
    #[arg(short, long = "where", action = clap::ArgAction::Append)]
    pub r#where: Vec<KeyValue>,
    /// Only show records matching a raw formula (overrides --where)
    #[arg(long)]
    pub formula: Option<String>,
    /// Only show records in this view
    #[arg(long, requires = "formula")]
    pub view: Option<String>,
}

#[derive(Debug, clap::Args)]
pub(crate) struct SearchArgs {
    /// Table name or ID
    pub table: String,
    /// The text to search for
    pub term: String,
    /// A field to search in (repeatable)
    #[arg(short, long = "field", action = clap::ArgAction::Append, required = true)]
    pub fields: Vec<String>,
    /// A raw formula that results must also match
    #[arg(long)]
    pub formula: Option<String>,
    /// Only search records in this view
    #[arg(long)]
    pub view: Option<String>,
    /// Maximum number of results
    #[arg(long, default_value_t = SearchSpec::DEFAULT_MAX_ROWS)]
    pub max_rows: usize,
}

#[derive(Debug, clap::Args)]
pub(crate) struct CreateArgs {
    /// Table name or ID
    pub table: String,
    /// A field=value pair to set (repeatable)
    #[arg(short, long = "set", action = clap::ArgAction::Append, required = true)]
    pub set: Vec<KeyValue>,
}

#[derive(Debug, clap::Args)]
pub(crate) struct UpdateArgs {
    /// Table name or ID
    pub table: String,
    /// The ID of the record to update
    #[arg(long, conflicts_with = "where")]
    pub id: Option<String>,
    /// Select the record by field=value (repeatable)
    #[arg(short, long = "where", action = clap::ArgAction::Append)]
    pub r#where: Vec<KeyValue>,
    /// A field=value pair to set (repeatable)
    #[arg(short, long = "set", action = clap::ArgAction::Append, required = true)]
    pub set: Vec<KeyValue>,
}

#[derive(Debug, clap::Args)]
pub(crate) struct SetArgs {
    /// Table name or ID
    pub table: String,
    /// Select the record by field=value (repeatable)
    #[arg(short, long = "where", action = clap::ArgAction::Append, required = true)]
    pub r#where: Vec<KeyValue>,
    /// A field=value pair to set; other fields are cleared (repeatable)
    #[arg(short, long = "set", action = clap::ArgAction::Append)]
    pub set: Vec<KeyValue>,
}

#[derive(Debug, clap::Args)]
pub(crate) struct RmArgs {
    /// Table name or ID
    pub table: String,
    /// Select records by field=value (repeatable)
    #[arg(short, long = "where", action = clap::ArgAction::Append, required = true)]
    pub r#where: Vec<KeyValue>,
    /// Delete every matching record instead of exactly one
    #[arg(long)]
    pub all: bool,
    /// Do not fail if no record matches
    #[arg(long)]
    pub if_exists: bool,
}

#[derive(Debug, clap::Args)]
pub(crate) struct FlushArgs {
    /// Table name or ID
    pub table: String,
    /// Confirm deleting every record
    #[arg(long)]
    pub yes: bool,
}

fn print_records(cli: &Cli, records: &[Record]) -> anyhow::Result<()> {
    match cli.output() {
        Output::Json => {
            serde_json::to_writer(stdout(), records)?;
            println!();
        }
        Output::Tty => {
            let mut tw = TabWriter::new(stdout());
            writeln!(&mut tw, "ID\tCREATED\tFIELDS")?;
            for record in records {
                writeln!(
                    &mut tw,
                    "{}\t{}\t{}",
                    record.id(),
                    record.created_time().unwrap_or("-"),
                    serde_json::to_string(record.fields())?
                )?;
            }

            tw.flush()?;
        }
    }

    Ok(())
}

pub(crate) fn get(cli: &Cli, args: GetArgs) -> anyhow::Result<()> {
    let GetArgs { table, id } = args;

    let record = cli.client.get_record(&table, &id)?;
    print_records(cli, &[record])
}

pub(crate) fn find(cli: &Cli, args: FindArgs) -> anyhow::Result<()> {
    let FindArgs {
        table,
        r#where,
        formula,
        view,
    } = args;

    let records = if let Some(formula) = formula {
        cli.client
            .find_records_by_formula(&table, &formula, view.as_deref())?
    } else {
        cli.client.find_records(&table, &criteria(r#where))?
    };

    print_records(cli, &records)
}

pub(crate) fn search(cli: &Cli, args: SearchArgs) -> anyhow::Result<()> {
    let SearchArgs {
        table,
        term,
        fields,
        formula,
        view,
        max_rows,
    } = args;

    let spec = SearchSpec {
        fields,
        search_term: term,
        extra_formula: formula,
        view,
        max_rows,
    };

    let records = cli.client.search_records(&table, &spec)?;
    print_records(cli, &records)
}

pub(crate) fn create(cli: &Cli, args: CreateArgs) -> anyhow::Result<()> {
    let CreateArgs { table, set } = args;

    let record = cli.client.create_record(&table, &fields(set))?;
    eprintln!("Created record {}", record.id());
    print_records(cli, &[record])
}

pub(crate) fn update(cli: &Cli, args: UpdateArgs) -> anyhow::Result<()> {
    let UpdateArgs {
        table,
        id,
        r#where,
        set,
    } = args;

    let record = match id {
        Some(id) => cli.client.update_record_by_id(&table, &id, &fields(set))?,
        None if r#where.is_empty() => bail!("Either --id or --where is required"),
        None => cli
            .client
            .update_record(&table, &criteria(r#where), &fields(set))?,
    };

    eprintln!("Updated record {}", record.id());
    print_records(cli, &[record])
}

pub(crate) fn set(cli: &Cli, args: SetArgs) -> anyhow::Result<()> {
    let SetArgs {
        table,
        r#where,
        set,
    } = args;

    let record = cli
        .client
        .set_record(&table, &criteria(r#where), &fields(set))?;

    eprintln!("Replaced record {}", record.id());
    print_records(cli, &[record])
}

pub(crate) fn rm(cli: &Cli, args: RmArgs) -> anyhow::Result<()> {
    let RmArgs {
        table,
        r#where,
        all,
        if_exists,
    } = args;

    let criteria = criteria(r#where);
    if all {
        cli.client.delete_records(&table, &criteria)?;
        eprintln!("Deleted matching records from \"{table}\"");
        return Ok(());
    }

    match cli.client.delete_record(&table, &criteria) {
        Ok(deleted) => eprintln!("Deleted record {}", deleted.id),
        Err(e) if if_exists && e.is_not_found() => {
            eprintln!("No matching record in \"{table}\"");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub(crate) fn flush(cli: &Cli, args: FlushArgs) -> anyhow::Result<()> {
    let FlushArgs { table, yes } = args;

    if !yes {
        bail!("Refusing to delete every record in \"{table}\" without --yes");
    }

    cli.client.flush_records(&table)?;
    eprintln!("Deleted every record in \"{table}\"");
    Ok(())
}

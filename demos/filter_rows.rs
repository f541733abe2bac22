//! Filter a small in-memory grid with synthesized predicates

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use gridpredicate::expression::Expression;
use gridpredicate::method::{ordinal_ignore_case, string_comparison_type};
use gridpredicate::synthesis::{
    call_method_type, call_method_type_many, description, member_underlying_type, not,
    property_member,
};
use gridpredicate::types::{EnumMember, EnumType, EnumValue};
use gridpredicate::{
    Accessor, MethodRegistry, Predicate, Record, RecordType, StringCondition, StringFilter,
    TypeDesc, Value,
};
use std::sync::Arc;

/// Filter rows of a sample employee grid
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Column to filter
    #[arg(short = 'C', long, default_value = "Name")]
    column: String,

    /// Condition, e.g. Contains, DoesNotContain, IsNullOrEmpty
    #[arg(short, long, default_value = "Contains", value_parser = parse_condition)]
    condition: StringCondition,

    /// Query text
    #[arg(short, long, default_value = "an")]
    query: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn parse_condition(s: &str) -> Result<StringCondition, String> {
    StringCondition::ALL
        .into_iter()
        .find(|c| format!("{:?}", c).eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown condition: {}", s))
}

fn department() -> Arc<EnumType> {
    Arc::new(EnumType::new(
        "Department",
        vec![
            EnumMember::with_description("Eng", 1, "Engineering"),
            EnumMember::with_description("Ops", 2, "Operations"),
            EnumMember::new("Misc", 3),
        ],
    ))
}

fn rows(employee: &Arc<RecordType>, department: &Arc<EnumType>) -> Result<Vec<Record>> {
    let data = [
        ("Ada Lovelace", Some("Countess"), 36, "Eng"),
        ("Grace Hopper", None, 85, "Eng"),
        ("Annie Easley", Some(""), 78, "Ops"),
        ("Dan Brown", Some("The Author"), 59, "Misc"),
    ];

    data.into_iter()
        .map(|(name, nickname, age, dept)| {
            let dept = EnumValue::named(department, dept)
                .ok_or_else(|| anyhow!("unknown department {}", dept))?;
            Record::new(
                employee.clone(),
                vec![
                    Value::from(name),
                    Value::from(nickname),
                    Value::Int32(age),
                    Value::from(dept),
                ],
            )
            .context("Failed to build row")
        })
        .collect()
}

fn print_matches(title: &str, predicate: &Predicate, rows: &[Record]) -> Result<()> {
    println!("{}", title);
    println!("  {}", predicate);
    for row in predicate.filter(rows)? {
        let name = row.get_by_name("Name").and_then(Value::as_str).unwrap_or("?");
        let dept = row
            .get_by_name("Department")
            .and_then(description)
            .unwrap_or("(no description)");
        println!("  - {} [{}]", name, dept);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let department = department();
    let employee = RecordType::builder("Employee")
        .property("Name", TypeDesc::String)
        .property("Nickname", TypeDesc::String)
        .field("Age", TypeDesc::Int32)
        .property("Department", TypeDesc::Enum(department.clone()))
        .event("Changed", "PropertyChangedEventHandler")
        .build();
    let rows = rows(&employee, &department)?;

    let registry = MethodRegistry::with_builtins();

    // Grid columns are stored boxed, as hosts keep mixed column lists
    let column = Accessor::property(&employee, &args.column)
        .and_then(|accessor| accessor.boxed())
        .with_context(|| format!("Unknown column {}", args.column))?;

    let member = property_member(Some(&column))
        .ok_or_else(|| anyhow!("Column {} is not a direct member", args.column))?;
    println!(
        "Column {} ({:?}) of type {}",
        member.name,
        member.kind,
        member_underlying_type(member)?
    );

    let filter = StringFilter::new(args.condition, args.query.clone());
    let predicate = filter.build(&registry, &column)?;
    print_matches(
        &format!("{} {:?}:", filter.condition, filter.query),
        &predicate,
        &rows,
    )?;

    let age = Accessor::property(&employee, "Age")?.boxed()?;
    let is_85 = call_method_type(&registry, &age, &TypeDesc::Int32, "Equals", TypeDesc::Int32, 85)?;
    print_matches("Age is not 85:", &not(&is_85), &rows)?;

    let name = Accessor::property(&employee, "Name")?;
    let starts_with_a = call_method_type_many(
        &registry,
        &name,
        &TypeDesc::String,
        "StartsWith",
        &[TypeDesc::String, string_comparison_type()],
        vec![Value::from("a"), ordinal_ignore_case()],
    )?;
    // Predicates combine only over the same row parameter
    let same_row_age = Accessor::new(
        name.parameter().clone(),
        Expression::member(Expression::parameter(name.parameter()), "Age")?,
    )?;
    let not_78 = not(&call_method_type(
        &registry,
        &same_row_age,
        &TypeDesc::Int32,
        "Equals",
        TypeDesc::Int32,
        78,
    )?);
    print_matches(
        "Name starts with 'a' and age is not 78:",
        &starts_with_a.and(&not_78)?,
        &rows,
    )?;

    if let Some(changed) = employee.member("Changed") {
        println!(
            "Event {} carries {}",
            changed.name,
            member_underlying_type(changed)?
        );
    }

    Ok(())
}

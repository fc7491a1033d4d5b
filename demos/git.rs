use arg_tree::{ArgList, Cmd, ErrorHandling, FlagSet};

const ROOT_HELP: &str = r#"A miniature git.

Run `git <command> -h` for the options and arguments of a command."#;

// Parse failures print usage and exit with status 2
fn command(name: &str, description: &str) -> Cmd {
    let flags = FlagSet::new(name, ErrorHandling::ExitOnError);
    Cmd::with_args(name, description, ArgList::new(flags))
}

fn remote() -> Cmd {
    let mut add = command("add", "Adds a remote named <name> at <url>");
    let fetch = add
        .args_mut()
        .flags_mut()
        .bool("f", false, "fetch right after the remote is set up");
    let name = add.args_mut().string("name", "", "`name` of the remote");
    let url = add.args_mut().string("url", "", "`url` of the remote repository");
    let add = add.run(move |args, _| {
        let name = args.value(&name);
        if name.contains('/') {
            return Err(format!("remote names cannot contain '/': {name}").into());
        }
        println!("adding remote {name} -> {}", args.value(&url));
        if *args.flags().value(&fetch) {
            println!("fetching {name}");
        }
        Ok(())
    });

    let mut remove = command("remove", "Removes the remote named <name>");
    let name = remove.args_mut().string("name", "", "`name` of the remote");
    let remove = remove.run(move |args, _| {
        println!("removing remote {}", args.value(&name));
        Ok(())
    });

    command("remote", "Manages the set of tracked repositories")
        .add_command(add)
        .add_command(remove)
}

fn log() -> Cmd {
    let mut log = command("log", "Shows commit logs");
    let count = log
        .args_mut()
        .flags_mut()
        .int("n", 10, "limit the number of `commits` to show");
    let ratio = log
        .args_mut()
        .float("ratio", 1.0, "sampling `ratio` of commits");
    log.run(move |args, tokens| {
        println!(
            "showing {} commits at ratio {} (from {tokens:?})",
            args.flags().value(&count),
            args.value(&ratio)
        );
        Ok(())
    })
}

pub fn main() -> anyhow::Result<()> {
    let mut git = command("git", "The stupid content tracker")
        .help(ROOT_HELP)
        .add_command(remote())
        .add_command(log())
        .build()?;

    // Parse failures exit with status 2, so only action errors reach this point
    git.dispatch_env()?;
    Ok(())
}

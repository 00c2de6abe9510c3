use super::*;

#[test]
fn test_extract_simple_chain() {
    let source = r#"
        var pg = builder.AddPostgres("pg")
            .WithDataVolume()
            .WithHostPort(5432);
    "#;

    let chains = extract_chains(source);
    assert_eq!(chains.len(), 1);

    let chain = &chains[0];
    assert_eq!(chain.variable_name.as_deref(), Some("pg"));
    assert_eq!(chain.base_object, "builder");
    assert_eq!(chain.root_method, "AddPostgres");
    assert_eq!(chain.name, "pg");
    assert_eq!(chain.root_args, vec![r#""pg""#.to_string()]);

    assert_eq!(chain.chained_methods.len(), 2);
    assert_eq!(chain.chained_methods[0].method, "WithDataVolume");
    assert!(chain.chained_methods[0].args.is_empty());
    assert_eq!(chain.chained_methods[1].method, "WithHostPort");
    assert_eq!(chain.chained_methods[1].args, vec!["5432".to_string()]);
}

#[test]
fn test_chain_without_variable() {
    let chains = extract_chains(r#"builder.AddRedis("cache");"#);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].variable_name, None);
    assert_eq!(chains[0].name, "cache");
}

#[test]
fn test_root_call_without_arguments() {
    let chains = extract_chains("builder.AddSomething().WithFoo(1);");
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].name, "");
    assert!(chains[0].root_args.is_empty());
    assert_eq!(chains[0].chained_methods.len(), 1);
}

#[test]
fn test_generic_root_call() {
    let source = r#"var api = builder.AddProject<Projects.Api>("api").WithExternalHttpEndpoints();"#;

    let chains = extract_chains(source);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].root_method, "AddProject");
    assert_eq!(chains[0].name, "api");
    assert!(chains[0].raw.contains("<Projects.Api>"));
    assert_eq!(chains[0].chained_methods[0].method, "WithExternalHttpEndpoints");
}

#[test]
fn test_typed_declaration_binds_variable() {
    let source = r#"IResourceBuilder<PostgresServerResource> pg = builder.AddPostgres("pg");"#;

    let chains = extract_chains(source);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].variable_name.as_deref(), Some("pg"));
}

#[test]
fn test_multiple_chains_keep_source_order() {
    let source = r#"
        var cache = builder.AddRedis("cache");
        var db = builder.AddPostgres("pg").AddDatabase("db");
        builder.AddNpmApp("web", "../web").WithReference(cache);
        builder.Build().Run();
    "#;

    let chains = extract_chains(source);
    let roots: Vec<&str> = chains.iter().map(|c| c.root_method.as_str()).collect();
    assert_eq!(roots, vec!["AddRedis", "AddPostgres", "AddNpmApp"]);
    // 後続の AddDatabase はチェーンの一部として読まれる
    assert_eq!(chains[1].chained_methods[0].method, "AddDatabase");
}

#[test]
fn test_comments_are_stripped() {
    let source = r#"
        // builder.AddRedis("commented");
        builder.AddRedis("real"); /* builder.AddMySql("hidden") */
        /*
         * builder.AddMongoDB("block");
         */
    "#;

    let chains = extract_chains(source);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].name, "real");
}

/// `#region` 行のアポストロフィで以降のコメント除去が止まらないこと
#[test]
fn test_preprocessor_lines_are_skipped() {
    let source = "#region Don't touch\n// builder.AddRedis(\"old\");\nbuilder.AddPostgres(\"pg\");\n#endregion\n";

    let chains = extract_chains(source);
    let names: Vec<&str> = chains.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["pg"]);
}

#[test]
fn test_indented_pragma_is_skipped() {
    let normalized = normalize_source("  #pragma warning disable CS0168 // it's fine\nbuilder.AddRedis(\"c\");");
    assert_eq!(normalized, "builder.AddRedis(\"c\");");
}

#[test]
fn test_hash_inside_line_or_literal_is_kept() {
    let normalized = normalize_source("var x = \"#a\"; y #b");
    assert_eq!(normalized, "var x = \"#a\"; y #b");
}

/// 閉じていない `'` は行末で終わり、次の行のコメントは除去される
#[test]
fn test_unclosed_char_literal_ends_at_newline() {
    let source = "var note = 'x;\n// builder.AddRedis(\"old\");\nbuilder.AddMySql(\"db\");";

    let chains = extract_chains(source);
    let names: Vec<&str> = chains.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["db"]);
}

#[test]
fn test_comment_markers_inside_strings_survive() {
    let source = r#"builder.AddContainer("web", "http://example.com/img") // trailing"#;

    let chains = extract_chains(source);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].root_args.len(), 2);
    assert_eq!(chains[0].root_args[1], r#""http://example.com/img""#);
}

#[test]
fn test_normalize_collapses_whitespace_outside_literals() {
    let normalized = normalize_source("a   .\n\tB(\"x  y\")  ");
    assert_eq!(normalized, "a . B(\"x  y\")");
}

#[test]
fn test_parens_and_commas_inside_strings() {
    let source = r#"builder.AddContainer("web", "nginx").WithEnvironment("GREETING", "hello (world), friend");"#;

    let chains = extract_chains(source);
    assert_eq!(chains.len(), 1);
    let env = &chains[0].chained_methods[0];
    assert_eq!(env.args.len(), 2);
    assert_eq!(env.args[1], r#""hello (world), friend""#);
}

#[test]
fn test_verbatim_strings() {
    let source = r#"builder.AddContainer("web", @"C:\images\").WithBindMount(@"C:\data", "/data");"#;

    let chains = extract_chains(source);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].root_args.len(), 2);
    let mount = &chains[0].chained_methods[0];
    assert_eq!(mount.args.len(), 2);
    assert_eq!(
        extract_first_string_arg(&mount.args[0]).as_deref(),
        Some(r"C:\data")
    );
}

#[test]
fn test_unbalanced_chain_is_skipped_and_scanning_continues() {
    let source = r#"
        builder.AddPostgres("pg".WithDataVolume(;
        builder.AddRedis("cache");
    "#;

    let scan = scan_chains(source);
    assert_eq!(scan.errors.len(), 1);
    assert!(matches!(scan.errors[0], ParseError::UnbalancedParens { .. }));
    assert_eq!(scan.chains.len(), 1);
    assert_eq!(scan.chains[0].name, "cache");
}

#[test]
fn test_unbalanced_error_context_is_truncated() {
    let long_tail = "x".repeat(200);
    let source = format!(r#"builder.AddPostgres("pg", {long_tail}"#);

    let scan = scan_chains(&source);
    assert!(scan.chains.is_empty());
    match &scan.errors[0] {
        ParseError::UnbalancedParens { context } => {
            assert!(context.ends_with("..."));
            assert!(context.chars().count() <= 83);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_lambda_argument_is_not_a_variable_binding() {
    let source = r#"var x = builder.AddRedis("r").RunAsContainer(c => c.WithImageTag("7"));"#;

    let chains = extract_chains(source);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].variable_name.as_deref(), Some("x"));
    let run = &chains[0].chained_methods[0];
    assert_eq!(run.method, "RunAsContainer");
    assert_eq!(run.raw_args, r#"c => c.WithImageTag("7")"#);
}

#[test]
fn test_calls_filter() {
    let chains = extract_chains(
        r#"builder.AddNpmApp("web").WaitFor(a).WithReference(b).WaitFor(c);"#,
    );
    let waits: Vec<&str> = chains[0]
        .calls("WaitFor")
        .map(|c| c.raw_args.as_str())
        .collect();
    assert_eq!(waits, vec!["a", "c"]);
}

// 引数分割

#[test]
fn test_parse_args_counts_top_level_only() {
    let args = parse_args(r#""a,b", Foo(1, 2), [3, 4], new { A = 1, B = 2 }, x"#);
    assert_eq!(args.len(), 5);
    assert_eq!(args[0], r#""a,b""#);
    assert_eq!(args[1], "Foo(1, 2)");
    assert_eq!(args[4], "x");
}

#[test]
fn test_parse_args_empty() {
    assert!(parse_args("").is_empty());
    assert!(parse_args("   ").is_empty());
    assert_eq!(parse_args("single"), vec!["single".to_string()]);
}

#[test]
fn test_extract_first_string_arg() {
    assert_eq!(
        extract_first_string_arg(r#"Projects.Api, "api""#).as_deref(),
        Some("api")
    );
    assert_eq!(
        extract_first_string_arg(r#""say \"hi\"""#).as_deref(),
        Some(r#"say "hi""#)
    );
    assert_eq!(extract_first_string_arg("5432"), None);
    assert_eq!(extract_first_string_arg(r#""unterminated"#), None);
}

#[test]
fn test_extract_named_args() {
    let args = parse_args(r#"port: 3000, targetPort: 8080, env: "PORT""#);
    let named = extract_named_args(&args);
    assert_eq!(named.len(), 3);
    assert_eq!(named["port"], "3000");
    assert_eq!(named["targetPort"], "8080");
    assert_eq!(named["env"], "PORT");
    assert!(positional_args(&args).is_empty());
}

#[test]
fn test_positional_and_named_mix() {
    let args = parse_args(r#"3000, name: "http", "a:b", flag ? 1 : 2"#);
    let named = extract_named_args(&args);
    assert_eq!(named.len(), 1);
    assert_eq!(named["name"], "http");
    assert_eq!(
        positional_args(&args),
        vec!["3000", r#""a:b""#, "flag ? 1 : 2"]
    );
}

#[test]
fn test_unquote_and_literal_detection() {
    assert!(is_string_literal(r#""value""#));
    assert!(is_string_literal(r#"@"C:\x""#));
    assert!(is_string_literal(r#"$"{a}-b""#));
    assert!(!is_string_literal("password"));
    assert_eq!(unquote(r#" "value" "#), "value");
    assert_eq!(unquote("password.Resource"), "password.Resource");
}

#[test]
fn test_parse_port() {
    assert_eq!(parse_port("5432"), Some(5432));
    assert_eq!(parse_port(r#""6379""#), Some(6379));
    assert_eq!(parse_port("abc"), None);
    assert_eq!(parse_port("70000"), None);
}

// ラムダ

#[test]
fn test_parse_lambda_expression_body() {
    let calls = parse_lambda_chain(r#"c => c.WithImageTag("16").WithDataVolume()"#);
    let methods: Vec<&str> = calls.iter().map(|c| c.method.as_str()).collect();
    assert_eq!(methods, vec!["WithImageTag", "WithDataVolume"]);
    assert_eq!(calls[0].args, vec![r#""16""#.to_string()]);
}

#[test]
fn test_parse_lambda_block_body() {
    let calls = parse_lambda_chain("(c) => { c.WithHostPort(5433); c.WithDataVolume(); }");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, "WithHostPort");
    assert_eq!(calls[1].method, "WithDataVolume");
}

#[test]
fn test_parse_lambda_typed_parameter_and_return() {
    let calls = parse_lambda_chain(
        "(IResourceBuilder<PostgresServerResource> server) => { return server.WithDataVolume(); }",
    );
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "WithDataVolume");
}

#[test]
fn test_parse_lambda_rejects_other_receivers() {
    assert!(parse_lambda_chain("c => other.WithDataVolume()").is_empty());
    assert!(parse_lambda_chain("no arrow here").is_empty());
    assert!(parse_lambda_chain("c => c.WithImageTag(\"x\"").is_empty());
}

#[test]
fn test_find_closing_paren() {
    let text = r#"f(a, "(", [b], {c})"#;
    assert_eq!(find_closing_paren(text, 1), Some(text.len() - 1));
    assert_eq!(find_closing_paren("f(a]", 1), None);
    assert_eq!(find_closing_paren("f(a", 1), None);
    assert_eq!(find_closing_paren("f(a)", 0), None);
}

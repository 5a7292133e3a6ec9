use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use v6addr::{ipv6::Address, AddrResult, AddrType, MacAddress};

/// Usage: `ipv6 <address|mac> [cidr...]`
///
/// A MAC address is turned into its link-local IPv6 address first.
fn main() -> AddrResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        // Configure formatting settings.
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .with_file(true)
        .with_line_number(true)
        // Set the subscriber as the default.
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(input) = args.get(1) else {
        eprintln!("usage: {} <address|mac> [cidr...]", args[0]);
        std::process::exit(2);
    };

    let addr = match input.parse::<MacAddress>() {
        Ok(mac) => {
            info!("deriving link-local address from {}", mac);
            Address::link_local(mac)
        }
        Err(_) => input.parse::<Address>()?,
    };

    println!("canonical:   {}", addr.to_canonical_string()?);
    println!("full:        {}", addr.to_fully_qualified());
    println!("json:        {}", addr.to_json()?);
    println!("loopback:    {}", addr.is_loopback());
    println!("private:     {}", addr.is_private());
    println!("link-local:  {}", addr.is_link_local());
    println!("routable:    {}", addr.is_routable());
    if addr.is_multicast() {
        println!(
            "multicast:   flags {:#x}, scope {:#x}",
            addr.get_multicast_flags(),
            addr.get_multicast_scope()
        );
    } else {
        println!("solicited:   {}", addr.get_solicited_node_address());
    }
    match addr.address_type() {
        AddrType::Teredo => println!("type:        teredo"),
        AddrType::SixToFour => println!("type:        6to4 via {}", addr.get_ipv4_for_6to4()?),
        AddrType::Normal => println!("type:        normal"),
    }
    if addr.is_ipv4_mapped() {
        println!("ipv4:        {}", addr.create_ipv4()?);
    }

    for cidr in &args[2..] {
        match addr.in_subnet(cidr) {
            Ok(inside) => println!("in {}: {}", cidr, inside),
            Err(err) => warn!("skipping {}: {}", cidr, err),
        }
    }

    Ok(())
}

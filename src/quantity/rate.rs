quantity!(RatePerWh, " cu/Wh");
